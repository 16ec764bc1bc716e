//! On-disk formats for events and clusters.

use crate::{Error, Result};
use std::path::Path;

/// Text format of an event or cluster file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One JSON object per line.
    JsonLines,
    /// Comma separated values with a header row.
    Csv,
}

impl Format {
    /// Infers the format from a file extension (case-insensitive).
    ///
    /// `.jsonl`, `.ndjson` and `.json` read as JSON Lines, `.csv` as CSV.
    ///
    /// # Errors
    /// Returns [`Error::UnknownFormat`] for any other extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jsonl" | "ndjson" | "json") => Ok(Self::JsonLines),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::UnknownFormat(path.display().to_string())),
        }
    }
}
