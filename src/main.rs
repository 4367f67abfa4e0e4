//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `warehouse_export` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Exit codes and user-facing output
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use warehouse_export::initialization::{init_client, init_logger_with};
use warehouse_export::jobs::{catalog, find_job, JobDefinition};
use warehouse_export::warehouse::SnowflakeConnector;
use warehouse_export::{run_export, ExportError, Opt, WarehouseConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), first from the
    // current directory, then from next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    if opt.list {
        for job in catalog() {
            println!("{:<32} {}", job.name, job.description);
            for file in job.file_names() {
                println!("{:<32}   -> {}", "", file);
            }
        }
        return Ok(());
    }

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let jobs = match select_jobs(&opt) {
        Ok(jobs) => jobs,
        Err(unknown) => {
            eprintln!(
                "warehouse_export error: unknown job(s): {} (see --list)",
                unknown.join(", ")
            );
            process::exit(1);
        }
    };

    // Configuration problems are fatal before any connection is attempted
    let config = match WarehouseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let e = ExportError::from(e);
            eprintln!("warehouse_export error: {:#}", e);
            process::exit(e.exit_code());
        }
    };

    let client = init_client().context("Failed to initialize HTTP client")?;
    let connector = SnowflakeConnector::new(config, client);

    let report = run_export(&connector, &jobs, &opt.output_dir).await;

    for job in &report.succeeded {
        for file in &job.files {
            println!("Wrote {} records to {}", file.records, file.path.display());
        }
    }
    for (name, e) in &report.failed {
        eprintln!("warehouse_export error: job {}: {:#}", name, e);
    }

    let code = report.exit_code();
    if code != 0 {
        process::exit(code);
    }
    println!(
        "All exports complete: {} job{} in {:.1}s",
        report.succeeded.len(),
        if report.succeeded.len() == 1 { "" } else { "s" },
        report.elapsed_seconds
    );
    Ok(())
}

/// Resolves the jobs named on the command line, or the whole catalog for `--all`.
fn select_jobs(opt: &Opt) -> Result<Vec<JobDefinition>, Vec<String>> {
    if opt.all {
        return Ok(catalog());
    }
    let (found, unknown): (Vec<_>, Vec<_>) = opt
        .jobs
        .iter()
        .map(|name| find_job(name).ok_or_else(|| name.clone()))
        .partition(Result::is_ok);
    if unknown.is_empty() {
        Ok(found.into_iter().flatten().collect())
    } else {
        Err(unknown.into_iter().filter_map(Result::err).collect())
    }
}
