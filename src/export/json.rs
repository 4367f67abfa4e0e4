//! JSON export.
//!
//! The dashboard reads each dataset as one JSON array of flat objects, so the
//! whole result is rendered at once (no JSON Lines).

use std::path::Path;

use crate::error_handling::ExportError;
use crate::record::Record;

use super::types::{ExportFormat, WrittenFile};
use super::writer::stage;

/// Renders records as a pretty-printed (2-space indent) UTF-8 JSON array.
///
/// An empty slice renders as `[]`.
pub fn render_json(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// Writes records to `path` as JSON, replacing any existing file.
///
/// # Returns
///
/// The written file, with the number of records exported.
pub fn export_json(records: &[Record], path: &Path) -> Result<WrittenFile, ExportError> {
    let bytes = render_json(records)?;
    stage(path, ExportFormat::Json, &bytes, records.len())?.commit()
}
