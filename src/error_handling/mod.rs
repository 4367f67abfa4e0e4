//! Error handling.
//!
//! Errors are categorized by where a job fails:
//! - **Configuration**: missing environment, unusable private key
//! - **Connection**: authentication or transport failure
//! - **Query**: the warehouse rejects or fails a statement
//! - **Serialization**: a value cannot be represented in the output format
//! - **Write**: the output file cannot be written

mod types;

// Re-export public API
pub use types::{ConfigError, ExportError, InitializationError, StatementFailure};
