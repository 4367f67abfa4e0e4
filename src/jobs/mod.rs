//! Export jobs.
//!
//! A job is a named set of exports run over one warehouse connection. The
//! catalog holds the built-in dashboard datasets; the driver runs one job to
//! completion.

mod catalog;
mod driver;
mod types;

pub use catalog::{catalog, find_job, job_names};
pub use driver::{run_job, JobReport, JobState};
pub use types::{ExportSpec, JobDefinition};
