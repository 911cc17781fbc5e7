//! Fuzz target: dispatch and binding of arbitrary request paths.
//!
//! Runs the real API route table against arbitrary paths and query strings.
//! Dispatch must be total, binding must never panic, and a handler must
//! accept anything its route binds.

#![no_main]

use http::Method;
use libfuzzer_sys::fuzz_target;
use waypoint_core::RouteMatch;
use waypoint_gateway::routes::api_table;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(table) = api_table() else {
        return;
    };
    let (path, query) = match input.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (input, None),
    };
    if let RouteMatch::Matched { route, captures } = table.dispatch(&Method::GET, path) {
        if let Ok(bound) = route.bind(captures, query, b"") {
            assert!(
                (route.handler())(&bound).is_ok(),
                "handler for {} rejected inputs its route accepted",
                route.pattern()
            );
        }
    }
});
