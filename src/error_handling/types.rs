//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Errors raised while loading and validating the warehouse configuration.
///
/// All of these are detected before any connection attempt is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more required environment variables are absent or empty.
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    /// The private key file could not be read.
    #[error("failed to read private key {}: {source}", path.display())]
    KeyRead {
        /// Path from `SNOWFLAKE_PRIVATE_KEY_PATH`
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The private key is encrypted but no passphrase was configured.
    #[error(
        "private key {} is encrypted; set SNOWFLAKE_PRIVATE_KEY_PASSPHRASE",
        path.display()
    )]
    PassphraseRequired {
        /// Path from `SNOWFLAKE_PRIVATE_KEY_PATH`
        path: PathBuf,
    },

    /// The private key could not be decoded or used for signing.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// A configured value is malformed (e.g. an unparsable host URL).
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// A statement failure reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    /// Snowflake response code (e.g. `002003`)
    pub code: Option<String>,
    /// ANSI SQL state, when provided
    pub sql_state: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for StatementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code {}", code)?;
            if let Some(state) = &self.sql_state {
                write!(f, ", sql state {}", state)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Errors that abort an export job.
///
/// None of these is retried; each surfaces to the process exit path after
/// the warehouse connection has been released.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Authentication or transport failure against the warehouse.
    #[error("connection error: {0}")]
    Connection(String),

    /// The warehouse rejected or failed the statement, or returned data we cannot decode.
    #[error("query error: {0}")]
    Query(String),

    /// A value could not be represented in the target format.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Output directory or file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl ExportError {
    /// Builds a query error from a warehouse statement failure.
    pub fn statement(failure: StatementFailure) -> Self {
        ExportError::Query(failure.to_string())
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExportError::Configuration(_) => 2,
            ExportError::Connection(_) => 3,
            ExportError::Query(_) => 4,
            ExportError::Serialization(_) => 5,
            ExportError::Write { .. } => 6,
        }
    }
}

impl From<ReqwestError> for ExportError {
    fn from(e: ReqwestError) -> Self {
        if e.is_decode() {
            ExportError::Query(format!("undecodable warehouse response: {}", e))
        } else {
            ExportError::Connection(e.to_string())
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Serialization(e.to_string())
    }
}
