// Shared test helpers: an in-memory warehouse and result-set builders.
//
// The fake connector hands out connections that answer queries from a
// scripted queue and count how often they were opened and closed.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use warehouse_export::warehouse::{
    BoundQuery, Column, ColumnType, Connection, Connector, RawValue, ResultSet,
};
use warehouse_export::ExportError;

/// One scripted answer: a result, or a statement failure with this message.
#[derive(Clone, Debug)]
pub enum Scripted {
    Rows(ResultSet),
    Fail(&'static str),
}

/// Counters shared between a connector and its connections.
#[derive(Clone, Debug, Default)]
pub struct Calls {
    pub connects: Arc<AtomicUsize>,
    pub executes: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

#[allow(dead_code)] // Not every test file reads every counter
impl Calls {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn executes(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Connector whose connections replay `script` in order.
#[derive(Debug, Default)]
pub struct FakeConnector {
    pub script: Vec<Scripted>,
    pub fail_connect: bool,
    pub fail_close: bool,
    pub calls: Calls,
}

#[allow(dead_code)]
impl FakeConnector {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    queue: VecDeque<Scripted>,
    fail_close: bool,
    calls: Calls,
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> Result<FakeConnection, ExportError> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ExportError::Connection("authentication failed".into()));
        }
        Ok(FakeConnection {
            queue: self.script.iter().cloned().collect(),
            fail_close: self.fail_close,
            calls: self.calls.clone(),
        })
    }
}

impl Connection for FakeConnection {
    async fn execute(&mut self, _query: &BoundQuery) -> Result<ResultSet, ExportError> {
        self.calls.executes.fetch_add(1, Ordering::SeqCst);
        match self.queue.pop_front() {
            Some(Scripted::Rows(result)) => Ok(result),
            Some(Scripted::Fail(message)) => Err(ExportError::Query(message.to_string())),
            None => Err(ExportError::Query("no scripted result left".into())),
        }
    }

    async fn close(self) -> Result<(), ExportError> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ExportError::Connection("connection reset".into()));
        }
        Ok(())
    }
}

/// `TRADE_DATE` (date) and `PRICE` (number(10,2)) rows.
#[allow(dead_code)]
pub fn price_rows(rows: &[(&str, &str)]) -> ResultSet {
    let mut result = ResultSet::new(vec![
        Column::new("TRADE_DATE", ColumnType::Date),
        Column::new("PRICE", ColumnType::Fixed { scale: 2 }),
    ]);
    for (date, price) in rows {
        result.rows.push(vec![
            RawValue::Date(NaiveDate::from_str(date).expect("valid date")),
            RawValue::Decimal(Decimal::from_str(price).expect("valid decimal")),
        ]);
    }
    result
}
