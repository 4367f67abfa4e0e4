//! Job definitions.

use crate::export::ExportFormat;
use crate::warehouse::BoundQuery;

/// One query and the file its result is written to.
#[derive(Debug, Clone)]
pub struct ExportSpec {
    /// Short label used in logs
    pub label: &'static str,
    /// File name beneath the output directory
    pub file_name: &'static str,
    /// Output encoding
    pub format: ExportFormat,
    /// Query producing the dataset
    pub query: BoundQuery,
}

/// A named unit of work: one connection, one or more exports.
///
/// All exports of a job are written together or not at all.
#[derive(Debug, Clone)]
pub struct JobDefinition {
    /// CLI name
    pub name: &'static str,
    /// One-line description for `--list`
    pub description: &'static str,
    /// Exports in execution order
    pub exports: Vec<ExportSpec>,
}

impl JobDefinition {
    /// Output file names, in export order.
    pub fn file_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.exports.iter().map(|e| e.file_name)
    }
}
