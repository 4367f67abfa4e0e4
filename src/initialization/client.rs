//! HTTP client initialization.

use reqwest::ClientBuilder;

use crate::config::{HTTP_CONNECT_TIMEOUT, HTTP_REQUEST_TIMEOUT, USER_AGENT};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used for the warehouse SQL API.
///
/// Creates a `reqwest::Client` configured with:
/// - the crate User-Agent
/// - connect and per-request timeouts
/// - gzip decoding (result partitions are served compressed)
/// - Rustls TLS backend (no native TLS)
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client() -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .user_agent(USER_AGENT)
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .gzip(true)
        .use_rustls_tls()
        .build()?;
    Ok(client)
}
