//! Export types.

use std::path::PathBuf;

use strum_macros::Display;

/// Output encoding of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    /// Array of records, pretty-printed with a 2-space indent
    Json,
    /// Header row with the query's column names, then one line per row
    Csv,
}

impl ExportFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// A file that has been written to its final location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenFile {
    /// Final path
    pub path: PathBuf,
    /// Output encoding
    pub format: ExportFormat,
    /// Number of records (data rows) in the file
    pub records: usize,
}
