//! Error types for loading visit logs

use thiserror::Error;

/// Schema and I/O failures raised before any report runs
#[derive(Error, Debug)]
pub enum IngestError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV (unbalanced quotes, ragged rows)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent after alias normalization
    #[error("missing required column `{column}`")]
    MissingColumn { column: &'static str },

    /// A cell could not be converted to the column's type
    #[error("invalid value {value:?} in column `{column}` at line {line}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// A configured alias points at a column name the loader does not know
    #[error("alias `{alias}` targets unknown column `{target}`")]
    UnknownAliasTarget { alias: String, target: String },

    /// A configured alias would send a known header to a different column
    #[error("alias `{alias}` already maps to `{existing}`, cannot remap it to `{target}`")]
    ConflictingAlias {
        alias: String,
        existing: &'static str,
        target: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
