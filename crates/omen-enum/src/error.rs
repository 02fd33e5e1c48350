//! Error types for guess enumeration and sessions.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnumError {
    #[error(transparent)]
    Model(#[from] omen_model::ModelError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("guess output failed: {0}")]
    Output(#[from] std::io::Error),

    #[error("could not install interrupt handler: {0}")]
    Signal(String),
}

/// Errors raised while saving or restoring an enumeration session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is corrupt: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session was saved by version {found}, the loaded ruleset is version {expected}")]
    VersionMismatch { found: String, expected: String },

    #[error("session was saved for ruleset {found:?}, loaded ruleset is {expected:?}")]
    RuleMismatch { found: String, expected: String },

    #[error("ruleset was re-trained since this session was saved (uuid {found} vs {expected})")]
    UuidMismatch { found: String, expected: String },

    #[error("session state does not match the loaded model: {0}")]
    Corrupt(String),
}
