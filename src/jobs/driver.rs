//! Job driver.
//!
//! A job moves through `INIT → CONNECTED → QUERIED → WRITTEN → CLOSED`.
//! Every export is queried and staged before any file is committed, and the
//! connection is closed on every path once it has been opened.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use strum_macros::Display;

use crate::error_handling::ExportError;
use crate::export::{
    commit_all, render_csv, render_json, stage, ExportFormat, StagedFile, WrittenFile,
};
use crate::warehouse::{run, Connection, Connector};

use super::types::{ExportSpec, JobDefinition};

/// Lifecycle state of a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum JobState {
    /// Nothing done yet
    Init,
    /// Warehouse connection open
    Connected,
    /// Every query executed and its output staged
    Queried,
    /// Every output file committed
    Written,
    /// Connection released
    Closed,
}

/// Outcome of a successful job.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Job name
    pub job: &'static str,
    /// Files written, in export order
    pub files: Vec<WrittenFile>,
    /// Wall-clock time from start to close
    pub elapsed: Duration,
}

impl JobReport {
    /// Total records across all files.
    pub fn total_records(&self) -> usize {
        self.files.iter().map(|f| f.records).sum()
    }
}

fn advance(job: &JobDefinition, state: &mut JobState, next: JobState) {
    debug!("{}: {} -> {}", job.name, state, next);
    *state = next;
}

/// Runs one job: connect, query and stage every export, commit, close.
///
/// # Errors
///
/// The first failure aborts the job. Staged files are discarded and files
/// already committed are rolled back, so existing output stays untouched.
/// The connection is still closed, and a close failure never masks the
/// original error.
pub async fn run_job<C: Connector>(
    connector: &C,
    job: &JobDefinition,
    output_dir: &Path,
) -> Result<JobReport, ExportError> {
    let started = Instant::now();
    let mut state = JobState::Init;
    info!("Running job {} ({} export(s))", job.name, job.exports.len());

    let mut connection = connector.connect().await?;
    advance(job, &mut state, JobState::Connected);

    let outcome = match stage_exports(&mut connection, job, output_dir).await {
        Ok(staged) => {
            advance(job, &mut state, JobState::Queried);
            commit_all(staged)
        }
        Err(e) => Err(e),
    };
    if outcome.is_ok() {
        advance(job, &mut state, JobState::Written);
    }

    let closed = connection.close().await;
    advance(job, &mut state, JobState::Closed);

    match (outcome, closed) {
        (Ok(files), closed) => {
            if let Err(e) = closed {
                warn!("{}: failed to close warehouse connection: {}", job.name, e);
            }
            for file in &files {
                info!("Wrote {} records to {}", file.records, file.path.display());
            }
            Ok(JobReport {
                job: job.name,
                files,
                elapsed: started.elapsed(),
            })
        }
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!(
                    "{}: failed to close warehouse connection after error: {}",
                    job.name, close_err
                );
            }
            Err(e)
        }
    }
}

async fn stage_exports<C: Connection>(
    connection: &mut C,
    job: &JobDefinition,
    output_dir: &Path,
) -> Result<Vec<StagedFile>, ExportError> {
    let mut staged = Vec::with_capacity(job.exports.len());
    for export in &job.exports {
        staged.push(stage_export(connection, export, output_dir).await?);
    }
    Ok(staged)
}

async fn stage_export<C: Connection>(
    connection: &mut C,
    export: &ExportSpec,
    output_dir: &Path,
) -> Result<StagedFile, ExportError> {
    info!("Fetching {}...", export.label);
    let target = output_dir.join(export.file_name);

    let (bytes, records) = match export.format {
        ExportFormat::Json => {
            let records = run(&export.query, connection).await?;
            (render_json(&records)?, records.len())
        }
        ExportFormat::Csv => {
            let result = connection.execute(&export.query).await?;
            (render_csv(&result)?, result.len())
        }
    };
    let staged = stage(&target, export.format, &bytes, records)?;
    debug!(
        "{}: {} rows ({} bytes) staged for {}",
        export.label,
        records,
        bytes.len(),
        staged.target().display()
    );
    Ok(staged)
}
