//! Tests for command-line parsing.

use clap::Parser;
use std::path::PathBuf;
use warehouse_export::config::{LogFormat, LogLevel, DEFAULT_OUTPUT_DIR};
use warehouse_export::jobs::find_job;
use warehouse_export::Opt;

#[test]
fn test_jobs_in_order_with_defaults() {
    let opt = Opt::try_parse_from(["warehouse_export", "core-chaos", "aapl-daily-activity"])
        .expect("valid arguments");

    assert_eq!(opt.jobs, vec!["core-chaos", "aapl-daily-activity"]);
    assert!(!opt.all);
    assert_eq!(opt.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert!(matches!(opt.log_level, LogLevel::Info));
    assert!(matches!(opt.log_format, LogFormat::Plain));
    assert!(opt.jobs.iter().all(|name| find_job(name).is_some()));
}

#[test]
fn test_job_or_flag_is_required() {
    assert!(Opt::try_parse_from(["warehouse_export"]).is_err());
    assert!(Opt::try_parse_from(["warehouse_export", "--all"]).is_ok());
    assert!(Opt::try_parse_from(["warehouse_export", "--list"]).is_ok());
}

#[test]
fn test_all_conflicts_with_named_jobs() {
    assert!(Opt::try_parse_from(["warehouse_export", "--all", "core-chaos"]).is_err());
}

#[test]
fn test_output_dir_and_logging_options() {
    let opt = Opt::try_parse_from([
        "warehouse_export",
        "--all",
        "--output-dir",
        "/tmp/data",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .unwrap();

    assert_eq!(opt.output_dir, PathBuf::from("/tmp/data"));
    assert!(matches!(opt.log_level, LogLevel::Debug));
    assert!(matches!(opt.log_format, LogFormat::Json));
}

#[test]
fn test_invalid_log_format_is_rejected() {
    assert!(Opt::try_parse_from(["warehouse_export", "--all", "--log-format", "xml"]).is_err());
}
