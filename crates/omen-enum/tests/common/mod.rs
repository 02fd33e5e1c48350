//! Shared fixtures: train a tiny corpus and materialise the model the
//! way `omen-train` then `load_rules` would.
#![allow(dead_code)]

use omen_model::{
    Alphabet, Model, ProgramDetails, RuleConfig, TrainingSettings,
};
use omen_train::{DiscretisedTables, NgramCounter};

pub fn rule_config(ngram: usize, max_level: u8, uuid: &str) -> RuleConfig {
    RuleConfig {
        program_details: ProgramDetails {
            name: "omen-train".into(),
            version: "0.1.0".into(),
            author: "omen-rs contributors".into(),
            contact: "".into(),
        },
        training_settings: TrainingSettings {
            training_file: "corpus.txt".into(),
            alphabet_encoding: "utf-8".into(),
            ngram,
            max_level,
            uuid: uuid.into(),
        },
    }
}

pub fn train_model(
    corpus: &[&str],
    alphabet: &str,
    ngram: usize,
    max_length: usize,
    max_level: u8,
) -> Model {
    let mut counter = NgramCounter::new(
        Alphabet::new(alphabet.chars()).expect("test alphabet"),
        ngram,
        max_length,
    );
    for password in corpus {
        counter.observe(password);
    }
    let tables = DiscretisedTables::new(&counter, max_level);
    Model::from_tables(rule_config(ngram, max_level, "fixture-uuid"), &tables)
        .expect("fixture model")
}
