// Error types shared by loading, normalization and dataset building.
use std::path::PathBuf;
use thiserror::Error;

/// The input file could not be read as a whole.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected a top-level JSON array in {0}")]
    NotAnArray(PathBuf),
}

/// Why a single raw entry was left out of the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("invalid date in '{field}': {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("malformed entry: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("no valid data found")]
    NoValidData,
}
