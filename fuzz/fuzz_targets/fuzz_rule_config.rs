//! Arbitrary bytes through the config.txt parser: must reject or accept,
//! never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use omen_model::RuleConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<RuleConfig>(text) {
            let _ = config.validate();
        }
    }
});
