//! CSV export.
//!
//! The header keeps the column names exactly as the warehouse returned them;
//! values are positional, in query column order. Unlike the JSON path, values
//! are not coerced: decimals keep their exact text.

use std::path::Path;

use csv::Writer;

use crate::error_handling::ExportError;
use crate::warehouse::{RawValue, ResultSet};

use super::types::{ExportFormat, WrittenFile};
use super::writer::stage;

/// Renders a result set as UTF-8 CSV with standard quoting.
///
/// An empty result renders as the header line alone.
pub fn render_csv(result: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(result.columns.iter().map(|c| c.name.as_str()))?;
    for row in &result.rows {
        writer.write_record(row.iter().map(RawValue::to_csv_field))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(format!("CSV buffer: {}", e.error())))
}

/// Writes a result set to `path` as CSV, replacing any existing file.
///
/// # Returns
///
/// The written file, with the number of data rows exported.
pub fn export_csv(result: &ResultSet, path: &Path) -> Result<WrittenFile, ExportError> {
    let bytes = render_csv(result)?;
    stage(path, ExportFormat::Csv, &bytes, result.len())?.commit()
}
