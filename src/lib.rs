//! warehouse_export library: dashboard dataset exports from Snowflake
//!
//! Each job connects to the warehouse with key-pair authentication, runs its
//! fixed queries with bound parameters, coerces the rows into JSON/CSV-safe
//! values and writes one static file per query for the dashboard to load.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use warehouse_export::initialization::init_client;
//! use warehouse_export::jobs::find_job;
//! use warehouse_export::warehouse::SnowflakeConnector;
//! use warehouse_export::{run_export, WarehouseConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WarehouseConfig::from_env()?;
//! let connector = SnowflakeConnector::new(config, init_client()?);
//! let jobs: Vec<_> = find_job("aapl-daily-activity").into_iter().collect();
//!
//! let report = run_export(&connector, &jobs, Path::new("public/assets/data")).await;
//! println!("{} job(s) succeeded, {} failed", report.succeeded.len(), report.failed.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Jobs run strictly one after another,
//! so a single-threaded runtime is enough.

#![warn(missing_docs)]

pub mod config;
pub mod error_handling;
pub mod export;
pub mod initialization;
pub mod jobs;
pub mod record;
pub mod warehouse;

// Re-export public API
pub use config::{LogFormat, LogLevel, Opt, WarehouseConfig};
pub use error_handling::{ConfigError, ExportError};
pub use run::{run_export, ExportReport};

// Runs a batch of jobs (the CLI's unit of work)
mod run {
    use std::path::Path;
    use std::time::Instant;

    use log::{error, info};

    use crate::error_handling::ExportError;
    use crate::jobs::{run_job, JobDefinition, JobReport};
    use crate::warehouse::Connector;

    /// Results of a batch of jobs.
    #[derive(Debug)]
    pub struct ExportReport {
        /// Jobs that wrote all of their files
        pub succeeded: Vec<JobReport>,
        /// Jobs that failed, with the error that stopped them
        pub failed: Vec<(&'static str, ExportError)>,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    impl ExportReport {
        /// Exit code for the batch: 0 when every job succeeded, otherwise the
        /// code of the first failure.
        pub fn exit_code(&self) -> i32 {
            self.failed
                .first()
                .map(|(_, e)| e.exit_code())
                .unwrap_or(0)
        }
    }

    /// Runs `jobs` sequentially, each on its own connection.
    ///
    /// A failed job does not stop the batch: jobs are independent and each
    /// one either writes all of its files or none.
    pub async fn run_export<C: Connector>(
        connector: &C,
        jobs: &[JobDefinition],
        output_dir: &Path,
    ) -> ExportReport {
        let started = Instant::now();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for job in jobs {
            match run_job(connector, job, output_dir).await {
                Ok(report) => {
                    info!(
                        "Job {} complete: {} records in {} file(s) ({:.1}s)",
                        report.job,
                        report.total_records(),
                        report.files.len(),
                        report.elapsed.as_secs_f64()
                    );
                    succeeded.push(report);
                }
                Err(e) => {
                    error!("Job {} failed: {}", job.name, e);
                    failed.push((job.name, e));
                }
            }
        }

        ExportReport {
            succeeded,
            failed,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        }
    }
}
