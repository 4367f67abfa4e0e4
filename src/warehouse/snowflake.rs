//! Snowflake SQL API v2 client.
//!
//! Statements are submitted with `POST /api/v2/statements`. The API answers
//! `200` with the first result partition, or `202` when the statement is
//! still running, in which case the statement handle is polled until it
//! completes. Remaining partitions are fetched in order.

use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    WarehouseConfig, KEYPAIR_JWT_TOKEN_TYPE, STATEMENTS_PATH, STATEMENT_POLL_INTERVAL,
};
use crate::error_handling::{ExportError, StatementFailure};

use super::auth::{KeyPair, SessionToken};
use super::query::BoundQuery;
use super::value::{decode_cell, Column, ColumnType, RawValue, ResultSet};
use super::{Connection, Connector};

const CONTEXT_QUERY: &str =
    "select current_role(), current_warehouse(), current_database(), current_schema()";

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bindings: Option<Value>,
    warehouse: &'a str,
    role: &'a str,
    database: &'a str,
    schema: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sql_state: Option<String>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    num_rows: Option<u64>,
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    scale: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionInfo {
    #[serde(default)]
    row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PartitionResponse {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

/// Opens [`SnowflakeConnection`]s for one validated configuration.
#[derive(Debug, Clone)]
pub struct SnowflakeConnector {
    config: WarehouseConfig,
    client: Client,
}

impl SnowflakeConnector {
    /// Creates a connector sharing `client` across connections.
    pub fn new(config: WarehouseConfig, client: Client) -> Self {
        Self { config, client }
    }
}

impl Connector for SnowflakeConnector {
    type Connection = SnowflakeConnection;

    async fn connect(&self) -> Result<SnowflakeConnection, ExportError> {
        SnowflakeConnection::open(self.config.clone(), self.client.clone()).await
    }
}

/// An authenticated SQL API session.
///
/// The SQL API is stateless; the "connection" is the signed JWT plus the
/// session context sent with every statement, and the handle of whichever
/// statement is still executing. The JWT is re-signed before any request
/// made when it is close to expiry, so long-running statements keep polling.
pub struct SnowflakeConnection {
    client: Client,
    config: WarehouseConfig,
    base_url: String,
    token: SessionToken,
    in_flight: Option<String>,
}

impl std::fmt::Debug for SnowflakeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeConnection")
            .field("account", &self.config.account)
            .field("base_url", &self.base_url)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl SnowflakeConnection {
    /// Authenticates with the configured key pair and checks the session context.
    ///
    /// # Errors
    ///
    /// - `ExportError::Configuration` if the private key cannot be loaded
    /// - `ExportError::Connection` if the warehouse rejects the credentials or is unreachable
    pub async fn open(config: WarehouseConfig, client: Client) -> Result<Self, ExportError> {
        let key = KeyPair::from_pem_file(
            &config.private_key_path,
            config.private_key_passphrase.as_deref(),
        )?;
        debug!("Loaded private key with fingerprint {}", key.fingerprint());
        let token = SessionToken::new(key, config.qualified_user(), Utc::now())?;

        let mut connection = Self {
            client,
            base_url: config.base_url(),
            config,
            token,
            in_flight: None,
        };

        let context = connection.execute(&BoundQuery::raw(CONTEXT_QUERY)).await?;
        let describe = |i: usize| {
            context
                .rows
                .first()
                .and_then(|row| row.get(i))
                .map(RawValue::to_csv_field)
                .unwrap_or_default()
        };
        info!(
            "Connected to {} (role={}, warehouse={}, database={}, schema={})",
            connection.config.account,
            describe(0),
            describe(1),
            describe(2),
            describe(3)
        );

        Ok(connection)
    }

    fn authorized(&mut self, request: RequestBuilder) -> Result<RequestBuilder, ExportError> {
        let token = self.token.current(Utc::now())?;
        Ok(request
            .bearer_auth(token)
            .header("X-Snowflake-Authorization-Token-Type", KEYPAIR_JWT_TOKEN_TYPE)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    fn statement_url(&self, handle: &str) -> String {
        format!("{}{}/{}", self.base_url, STATEMENTS_PATH, handle)
    }

    async fn submit(&mut self, query: &BoundQuery) -> Result<StatementResponse, ExportError> {
        let body = StatementRequest {
            statement: query.sql(),
            bindings: query.api_bindings(),
            warehouse: &self.config.warehouse,
            role: &self.config.role,
            database: &self.config.database,
            schema: &self.config.schema,
        };
        let request = self
            .client
            .post(format!("{}{}", self.base_url, STATEMENTS_PATH))
            .json(&body);
        let response = self.authorized(request)?.send().await?;
        self.read_statement(response).await
    }

    /// Reads a statement response, polling while the statement is still running.
    async fn read_statement(&mut self, response: Response) -> Result<StatementResponse, ExportError> {
        let mut response = response;
        loop {
            let status = response.status();
            if status == StatusCode::OK {
                return Ok(response.json::<StatementResponse>().await?);
            }
            if status != StatusCode::ACCEPTED {
                let text = response.text().await.unwrap_or_default();
                return Err(error_for_status(status, &text));
            }

            let pending: StatementResponse = response.json().await?;
            let handle = pending.statement_handle.ok_or_else(|| {
                ExportError::Query("asynchronous statement response without a handle".into())
            })?;
            debug!("Statement {} still running; polling", handle);
            self.in_flight = Some(handle.clone());

            tokio::time::sleep(STATEMENT_POLL_INTERVAL).await;
            let request = self.client.get(self.statement_url(&handle));
            response = self.authorized(request)?.send().await?;
        }
    }

    async fn fetch_partition(
        &mut self,
        handle: &str,
        partition: usize,
    ) -> Result<Vec<Vec<Option<String>>>, ExportError> {
        let request = self
            .client
            .get(self.statement_url(handle))
            .query(&[("partition", partition)]);
        let response = self.authorized(request)?.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }
        Ok(response.json::<PartitionResponse>().await?.data)
    }
}

impl Connection for SnowflakeConnection {
    async fn execute(&mut self, query: &BoundQuery) -> Result<ResultSet, ExportError> {
        debug!(
            "Executing statement ({} bound values): {}",
            query.binds().len(),
            query.sql().trim()
        );
        let response = self.submit(query).await?;

        let meta = response.result_set_meta_data.ok_or_else(|| {
            ExportError::Query("statement response has no result set metadata".into())
        })?;
        let columns: Vec<Column> = meta
            .row_type
            .iter()
            .map(|rt| Column::new(rt.name.clone(), ColumnType::from_api(&rt.type_name, rt.scale)))
            .collect();

        let mut result = ResultSet::new(columns);
        append_rows(&mut result, response.data)?;

        if meta.partition_info.len() > 1 {
            let handle = response.statement_handle.ok_or_else(|| {
                ExportError::Query("partitioned result without a statement handle".into())
            })?;
            self.in_flight = Some(handle.clone());
            for (partition, info) in meta.partition_info.iter().enumerate().skip(1) {
                debug!(
                    "Fetching partition {} of {} ({} rows)",
                    partition + 1,
                    meta.partition_info.len(),
                    info.row_count.unwrap_or_default()
                );
                let data = self.fetch_partition(&handle, partition).await?;
                append_rows(&mut result, data)?;
            }
        }
        self.in_flight = None;

        if let Some(expected) = meta.num_rows {
            if expected != result.len() as u64 {
                return Err(ExportError::Query(format!(
                    "expected {} rows but received {}",
                    expected,
                    result.len()
                )));
            }
        }
        debug!("Fetched {} rows", result.len());
        Ok(result)
    }

    async fn close(mut self) -> Result<(), ExportError> {
        let Some(handle) = self.in_flight.take() else {
            debug!("Closing connection to {}", self.config.account);
            return Ok(());
        };

        warn!("Cancelling statement {} still in flight", handle);
        let request = self
            .client
            .post(format!("{}/cancel", self.statement_url(&handle)));
        let response = self.authorized(request)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }
        Ok(())
    }
}

fn append_rows(result: &mut ResultSet, data: Vec<Vec<Option<String>>>) -> Result<(), ExportError> {
    result.rows.reserve(data.len());
    for cells in data {
        if cells.len() != result.columns.len() {
            return Err(ExportError::Query(format!(
                "row has {} values but the result has {} columns",
                cells.len(),
                result.columns.len()
            )));
        }
        let row = cells
            .iter()
            .zip(&result.columns)
            .map(|(cell, column)| {
                decode_cell(cell.as_deref(), &column.column_type).map_err(|e| {
                    ExportError::Query(format!("column {}: {}", column.name, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        result.rows.push(row);
    }
    Ok(())
}

/// Maps a non-success SQL API response to the error taxonomy.
fn error_for_status(status: StatusCode, body: &str) -> ExportError {
    let parsed: StatementResponse = serde_json::from_str(body).unwrap_or_default();
    let failure = StatementFailure {
        code: parsed.code,
        sql_state: parsed.sql_state,
        message: parsed
            .message
            .unwrap_or_else(|| body.trim().chars().take(500).collect()),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ExportError::Connection(format!("authentication failed ({}): {}", status, failure))
        }
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::UNPROCESSABLE_ENTITY => ExportError::statement(failure),
        _ => ExportError::Connection(format!("HTTP {}: {}", status, failure)),
    }
}
