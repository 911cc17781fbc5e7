//! Fuzz target: `Item` body decoding.
//!
//! Arbitrary bytes fed to the body decoder must never panic; a rejected body
//! must always carry at least one field error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use waypoint_core::Item;

fuzz_target!(|data: &[u8]| {
    match Item::decode(data) {
        Ok(item) => {
            let _ = item.snapshot();
        }
        Err(errors) => assert!(!errors.is_empty(), "rejection without a reason"),
    }
});
