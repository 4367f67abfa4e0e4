//! Type coercion from warehouse values to serialization-safe values.

use crate::error_handling::ExportError;
use crate::warehouse::{Column, RawValue, ResultSet};

use super::{Record, Value};

/// Coerces one raw value.
///
/// - decimals become the nearest `f64`
/// - dates, times and timestamps become ISO-8601 strings
/// - null, booleans, integers and text pass through
///
/// # Errors
///
/// Returns `ExportError::Serialization` for NaN and infinite floats, which
/// JSON cannot represent.
pub fn coerce_value(raw: &RawValue) -> Result<Value, ExportError> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Bool(b) => Ok(Value::Bool(*b)),
        RawValue::Integer(i) => Ok(Value::Integer(*i)),
        RawValue::Text(s) => Ok(Value::String(s.clone())),
        // Parsing the exact decimal text gives the correctly rounded f64.
        RawValue::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ExportError::Serialization(format!("decimal {}: {}", d, e))),
        RawValue::Float(f) if f.is_finite() => Ok(Value::Float(*f)),
        RawValue::Float(f) => Err(ExportError::Serialization(format!(
            "non-finite float {} has no JSON representation",
            f
        ))),
        RawValue::Date(_)
        | RawValue::Time(_)
        | RawValue::Timestamp(_)
        | RawValue::TimestampTz(_) => Ok(Value::String(raw.iso8601().unwrap_or_default())),
    }
}

/// Builds a record from one row, lower-casing the column names.
///
/// Columns whose names differ only in case share one key; the last one wins.
///
/// # Errors
///
/// Propagates [`coerce_value`] failures, naming the column.
pub fn coerce_row(columns: &[Column], row: &[RawValue]) -> Result<Record, ExportError> {
    let mut record = Record::new();
    for (column, raw) in columns.iter().zip(row) {
        let value = coerce_value(raw).map_err(|e| match e {
            ExportError::Serialization(msg) => {
                ExportError::Serialization(format!("column {}: {}", column.name, msg))
            }
            other => other,
        })?;
        record.push(column.name.to_lowercase(), value);
    }
    Ok(record)
}

/// Coerces every row of a result set, preserving row order.
pub fn coerce_result_set(result: &ResultSet) -> Result<Vec<Record>, ExportError> {
    result
        .rows
        .iter()
        .map(|row| coerce_row(&result.columns, row))
        .collect()
}
