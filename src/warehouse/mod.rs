//! Warehouse access.
//!
//! [`Connector`] and [`Connection`] are the seam between the job driver and
//! the warehouse: the driver only needs to open a connection, execute bound
//! queries on it and close it. [`SnowflakeConnector`] implements them over the
//! Snowflake SQL API.

mod auth;
mod query;
mod snowflake;
mod value;

pub use auth::{KeyPair, SessionToken};
pub use query::{BindValue, BoundQuery, QueryBuilder, Separated};
pub use snowflake::{SnowflakeConnection, SnowflakeConnector};
pub use value::{decode_cell, Column, ColumnType, RawValue, ResultSet};

use crate::config::WarehouseConfig;
use crate::error_handling::ExportError;
use crate::initialization::init_client;
use crate::record::{coerce_result_set, Record};

/// Opens connections to a warehouse.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// Connection type produced by this connector.
    type Connection: Connection;

    /// Authenticates and returns a ready connection.
    async fn connect(&self) -> Result<Self::Connection, ExportError>;
}

/// An open warehouse connection.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// Executes a bound query and fetches the complete result.
    async fn execute(&mut self, query: &BoundQuery) -> Result<ResultSet, ExportError>;

    /// Releases the connection, cancelling anything still running.
    async fn close(self) -> Result<(), ExportError>;
}

/// Opens a Snowflake connection for `config`.
///
/// # Errors
///
/// See [`SnowflakeConnection::open`].
pub async fn connect(config: &WarehouseConfig) -> Result<SnowflakeConnection, ExportError> {
    let client = init_client()
        .map_err(|e| ExportError::Connection(format!("cannot build HTTP client: {}", e)))?;
    SnowflakeConnection::open(config.clone(), client).await
}

/// Executes `query` on `connection` and returns the coerced records.
///
/// # Errors
///
/// Propagates query failures and coercion failures (non-finite floats).
pub async fn run<C: Connection>(
    query: &BoundQuery,
    connection: &mut C,
) -> Result<Vec<Record>, ExportError> {
    let result = connection.execute(query).await?;
    coerce_result_set(&result)
}
