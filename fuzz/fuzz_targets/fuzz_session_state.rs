//! Arbitrary bytes through the session-state JSON decoder.

#![no_main]

use libfuzzer_sys::fuzz_target;
use omen_enum::EnumeratorState;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<EnumeratorState>(data);
});
