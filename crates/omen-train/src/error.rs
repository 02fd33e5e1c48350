//! Error types for training.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for trainer operations.
pub type Result<T> = std::result::Result<T, TrainError>;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("could not open training corpus {path}: {source}")]
    CorpusOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading training corpus: {0}")]
    CorpusRead(#[from] std::io::Error),

    #[error("alphabet size {size} is below the minimum of {min}; sizes this small are almost always a typo")]
    AlphabetTooSmall { size: usize, min: usize },

    #[error("corpus contained no admissible symbols to learn an alphabet from")]
    NothingToLearn,

    #[error("unsupported corpus encoding {0:?}; this build reads UTF-8 (and its ASCII subset)")]
    UnsupportedEncoding(String),

    #[error(transparent)]
    Model(#[from] omen_model::ModelError),
}
