//! Fuzz target: campaign action JSON deserialization
//!
//! Feeds arbitrary bytes to serde_json to detect panics in the action ABI,
//! including the string-or-integer amount decoding.
//!
//! Run: cargo +nightly fuzz run fuzz_action_deserialize -- -max_len=4096

#![no_main]
use ballot_vm::{validate_action, BallotAction, CallRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(action) = serde_json::from_slice::<BallotAction>(data) {
        let _ = validate_action(&action);
        let _ = action.is_query();
    }
    let _: Result<CallRequest, _> = serde_json::from_slice(data);
});
