//! Error types for ruleset models.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Unified error type for loading, validating, and saving rulesets.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} line {line}: {reason}")]
    Malformed {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("level {level} outside [0, {max_level}] in {file}")]
    LevelOutOfRange {
        file: PathBuf,
        level: i64,
        max_level: u8,
    },

    #[error("ruleset config error: {0}")]
    Config(String),

    #[error("ruleset was created by trainer version {found}, need at least {required}")]
    VersionTooOld { found: String, required: String },

    #[error("{table} table has no entries at any level")]
    EmptyTable { table: &'static str },

    #[error("invalid alphabet: {0}")]
    Alphabet(String),
}
