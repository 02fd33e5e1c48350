//! OMEN ruleset model.
//!
//! This crate provides the shared foundation for the OMEN trainer and
//! enumerator:
//! - The symbol [`Alphabet`] and the canonical prefix iteration order
//! - The ruleset configuration stored in `config.txt`
//! - The immutable [`Model`] with its four level tables (IP, EP, CP, LN)
//! - Reading and writing the on-disk rule directory
//!
//! The trainer produces levels through the [`RuleTables`] abstraction; the
//! enumerator consumes a loaded [`Model`]. The model is read-only after
//! load, so both tools can share it freely.

pub mod alphabet;
pub mod config;
pub mod error;
pub mod model;
pub mod reader;
pub mod writer;

pub use alphabet::{Alphabet, PrefixIter, DEFAULT_ALPHABET};
pub use config::{ProgramDetails, RuleConfig, TrainingSettings, DEFAULT_MAX_LEVEL};
pub use error::{ModelError, Result};
pub use model::{ContextTable, Model, RuleTables};
pub use reader::load_rules;
pub use writer::write_rules;

use std::path::{Path, PathBuf};

/// Name of the directory that groups rulesets under the base directory.
pub const RULES_DIR: &str = "Rules";

/// Directory holding one named ruleset: `<base>/Rules/<name>`.
pub fn rule_directory(base: &Path, rule_name: &str) -> PathBuf {
    base.join(RULES_DIR).join(rule_name)
}
