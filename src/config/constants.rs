//! Configuration constants.
//!
//! This module defines defaults and protocol constants used throughout the
//! application.

use std::time::Duration;

/// Default directory for exported files (served by the dashboard front end).
pub const DEFAULT_OUTPUT_DIR: &str = "public/assets/data";

/// HTTP User-Agent sent to the warehouse.
pub const USER_AGENT: &str = concat!("warehouse_export/", env!("CARGO_PKG_VERSION"));

/// Overall HTTP request timeout for a single SQL API call.
///
/// Long-running statements are not bounded by this: the API answers with
/// 202 and the statement is polled.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// TCP connect timeout for the SQL API.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between status polls of an asynchronously executing statement.
pub const STATEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifetime of a key-pair JWT (Snowflake rejects anything over one hour).
pub const JWT_LIFETIME_SECS: i64 = 3600;

/// A JWT this close to expiry is re-signed before the next request.
pub const JWT_RENEW_MARGIN_SECS: i64 = 300;

/// Path of the SQL API statements endpoint.
pub const STATEMENTS_PATH: &str = "/api/v2/statements";

/// Token type header value for key-pair authentication.
pub const KEYPAIR_JWT_TOKEN_TYPE: &str = "KEYPAIR_JWT";

/// Bias added by the SQL API to `TIMESTAMP_TZ` offsets (minutes).
pub const TIMESTAMP_TZ_OFFSET_BIAS: i32 = 1440;
