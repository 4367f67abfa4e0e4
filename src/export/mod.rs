//! Dataset export.
//!
//! Query results are written as JSON (coerced records) or CSV (raw values).
//! Writes go through a temporary file in the target directory so a reader
//! never observes a partially written dataset.

mod csv;
mod json;
mod types;
mod writer;

pub use csv::{export_csv, render_csv};
pub use json::{export_json, render_json};
pub use types::{ExportFormat, WrittenFile};
pub use writer::{commit_all, stage, StagedFile};
