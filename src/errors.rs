use std::io;

use thiserror::Error;

/// Errors that abort a categorization run.
///
/// An ambiguous group is not an error: it is reported through the `inspect`
/// disposition instead.
#[derive(Debug, Error)]
pub enum CategorizeError {
    #[error("did not find required column '{column}' in vidinfo table")]
    Schema { column: String },
    #[error("row {row}: cannot parse {column} value '{value}'")]
    MalformedValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: {column} is required to arbitrate but is blank")]
    MissingValue { row: usize, column: &'static str },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("input is not valid UTF-16: {0}")]
    Encoding(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, CategorizeError>;
