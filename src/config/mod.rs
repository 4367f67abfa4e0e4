//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, protocol values, defaults)
//! - CLI option types and parsing
//! - The warehouse configuration loaded from the environment

mod constants;
mod types;
mod warehouse;

// Re-export all constants
pub use constants::*;
pub use types::{LogFormat, LogLevel, Opt};
pub use warehouse::{EnvKey, WarehouseConfig};
