//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON outside of an event stream (settings files).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV failure that is not tied to an input line.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed record in an event stream.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number in the input.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// File extension that maps to no known format.
    #[error("cannot infer file format from '{0}' (expected .csv, .jsonl or .json)")]
    UnknownFormat(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] calowin_core::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
