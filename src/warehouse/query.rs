//! Bound-parameter query building.
//!
//! Values are never spliced into SQL text. [`QueryBuilder`] collects SQL
//! fragments and `?` placeholders side by side with the values bound to them,
//! and produces a [`BoundQuery`] for execution.

use serde_json::{json, Map, Value};

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// VARCHAR (also used for dates; wrap the placeholder in `to_date(?)`)
    Text(String),
    /// NUMBER with scale 0
    Integer(i64),
    /// FLOAT
    Real(f64),
    /// BOOLEAN
    Boolean(bool),
}

impl BindValue {
    /// SQL API binding type name.
    pub fn api_type(&self) -> &'static str {
        match self {
            BindValue::Text(_) => "TEXT",
            BindValue::Integer(_) => "FIXED",
            BindValue::Real(_) => "REAL",
            BindValue::Boolean(_) => "BOOLEAN",
        }
    }

    /// SQL API binding value (always a string).
    pub fn api_value(&self) -> String {
        match self {
            BindValue::Text(s) => s.clone(),
            BindValue::Integer(i) => i.to_string(),
            BindValue::Real(f) => f.to_string(),
            BindValue::Boolean(b) => b.to_string(),
        }
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Integer(i)
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Real(f)
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Boolean(b)
    }
}

/// SQL text with positional `?` placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    sql: String,
    binds: Vec<BindValue>,
}

impl BoundQuery {
    /// A query without bind values.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values in placeholder order.
    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    /// The SQL API `bindings` object (`{"1": {"type": .., "value": ..}, ...}`),
    /// or `None` when nothing is bound.
    pub fn api_bindings(&self) -> Option<Value> {
        if self.binds.is_empty() {
            return None;
        }
        let bindings: Map<String, Value> = self
            .binds
            .iter()
            .enumerate()
            .map(|(i, bind)| {
                (
                    (i + 1).to_string(),
                    json!({ "type": bind.api_type(), "value": bind.api_value() }),
                )
            })
            .collect();
        Some(Value::Object(bindings))
    }
}

/// Incrementally builds a [`BoundQuery`].
///
/// ```
/// use warehouse_export::warehouse::QueryBuilder;
///
/// let mut qb = QueryBuilder::new("select * from prices where ticker in (");
/// let mut tickers = qb.separated(", ");
/// for t in ["AAPL", "MSFT"] {
///     tickers.push_bind(t);
/// }
/// qb.push(") and trade_date >= to_date(");
/// qb.push_bind("2025-01-02");
/// qb.push(")");
///
/// let query = qb.build();
/// assert_eq!(
///     query.sql(),
///     "select * from prices where ticker in (?, ?) and trade_date >= to_date(?)"
/// );
/// assert_eq!(query.binds().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct QueryBuilder {
    sql: String,
    binds: Vec<BindValue>,
}

impl QueryBuilder {
    /// Starts a query with the given SQL.
    pub fn new(init: impl Into<String>) -> Self {
        Self {
            sql: init.into(),
            binds: Vec::new(),
        }
    }

    /// Appends raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a `?` placeholder bound to `value`.
    pub fn push_bind(&mut self, value: impl Into<BindValue>) -> &mut Self {
        self.sql.push('?');
        self.binds.push(value.into());
        self
    }

    /// Starts a list of items joined by `separator` (e.g. the body of an `IN (...)`).
    pub fn separated<'qb>(&'qb mut self, separator: &'static str) -> Separated<'qb> {
        Separated {
            builder: self,
            separator,
            first: true,
        }
    }

    /// Finishes the query.
    pub fn build(self) -> BoundQuery {
        BoundQuery {
            sql: self.sql,
            binds: self.binds,
        }
    }
}

/// A separator-joined list inside a [`QueryBuilder`].
pub struct Separated<'qb> {
    builder: &'qb mut QueryBuilder,
    separator: &'static str,
    first: bool,
}

impl Separated<'_> {
    /// Appends a separator (except before the first item) and a bound placeholder.
    pub fn push_bind(&mut self, value: impl Into<BindValue>) -> &mut Self {
        if !self.first {
            self.builder.push(self.separator);
        }
        self.first = false;
        self.builder.push_bind(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_bind_records_values_in_order() {
        let mut qb = QueryBuilder::new("select 1 where a = ");
        qb.push_bind("x").push(" and b = ").push_bind(7i64);
        let q = qb.build();
        assert_eq!(q.sql(), "select 1 where a = ? and b = ?");
        assert_eq!(
            q.binds(),
            &[BindValue::Text("x".into()), BindValue::Integer(7)]
        );
    }

    #[test]
    fn test_separated_list() {
        let mut qb = QueryBuilder::new("in (");
        {
            let mut list = qb.separated(",");
            for t in ["A", "B", "C"] {
                list.push_bind(t);
            }
        }
        qb.push(")");
        assert_eq!(qb.build().sql(), "in (?,?,?)");
    }

    #[test]
    fn test_values_with_quotes_stay_out_of_sql() {
        let mut qb = QueryBuilder::new("where ticker = ");
        qb.push_bind("AAPL'; drop table t; --");
        let q = qb.build();
        assert_eq!(q.sql(), "where ticker = ?");
        assert!(!q.sql().contains("drop"));
    }

    #[test]
    fn test_api_bindings_shape() {
        let mut qb = QueryBuilder::new("");
        qb.push_bind("AAPL")
            .push_bind(90i64)
            .push_bind(0.15)
            .push_bind(true);
        let bindings = qb.build().api_bindings().expect("bindings present");
        assert_eq!(
            bindings,
            json!({
                "1": {"type": "TEXT", "value": "AAPL"},
                "2": {"type": "FIXED", "value": "90"},
                "3": {"type": "REAL", "value": "0.15"},
                "4": {"type": "BOOLEAN", "value": "true"},
            })
        );
    }

    #[test]
    fn test_raw_query_has_no_bindings() {
        assert!(BoundQuery::raw("select current_role()")
            .api_bindings()
            .is_none());
    }
}
