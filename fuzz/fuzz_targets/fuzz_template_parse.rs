//! Fuzz target: route template compilation.
//!
//! Arbitrary strings must either compile or produce `InvalidTemplate`, and a
//! compiled pattern must survive matching against its own template text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use waypoint_core::PathPattern;

fuzz_target!(|data: &[u8]| {
    let Ok(template) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(pattern) = PathPattern::parse(template) {
        let segments: Vec<&str> = template.trim_start_matches('/').split('/').collect();
        let _ = pattern.captures(&segments);
        let _ = pattern.rank();
    }
});
