//! Arbitrary bytes as the level files of a rule directory. The loader
//! must reject corrupt tables with an error, never a panic, and anything
//! it accepts must pass model validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use omen_model::load_rules;

const CONFIG: &str = r#"
[program_details]
name = "omen-train"
version = "0.1.0"
author = "fuzz"
contact = ""

[training_settings]
training_file = "corpus.txt"
alphabet_encoding = "utf-8"
ngram = 2
max_level = 4
uuid = "fuzz-uuid"
"#;

fuzz_target!(|data: &[u8]| {
    // Split the input into the four level tables; config and alphabet
    // stay fixed so the fuzzer concentrates on the table parsers.
    let mut parts = data.splitn(4, |&b| b == 0);
    let ip = parts.next().unwrap_or_default();
    let ep = parts.next().unwrap_or_default();
    let cp = parts.next().unwrap_or_default();
    let ln = parts.next().unwrap_or_default();

    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(_) => return,
    };
    let write = |name: &str, bytes: &[u8]| std::fs::write(dir.path().join(name), bytes);
    if write("config.txt", CONFIG.as_bytes()).is_err()
        || write("alphabet.txt", b"a\nb\n").is_err()
        || write("IP.level", ip).is_err()
        || write("EP.level", ep).is_err()
        || write("CP.level", cp).is_err()
        || write("LN.level", ln).is_err()
    {
        return;
    }

    if let Ok(model) = load_rules(dir.path(), Some("0.1")) {
        model.validate().expect("accepted model must validate");
    }
});
