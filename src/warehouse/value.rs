//! Warehouse-native values and result sets.
//!
//! The SQL API returns every cell as a JSON string (or null) whose encoding
//! depends on the column type. [`decode_cell`] turns such a cell into a
//! [`RawValue`] using the column metadata.

use std::str::FromStr;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc,
};
use rust_decimal::Decimal;

use crate::config::TIMESTAMP_TZ_OFFSET_BIAS;

/// Warehouse column type, as reported in the result metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// NUMBER/DECIMAL with the given scale
    Fixed {
        /// Digits after the decimal point
        scale: u32,
    },
    /// FLOAT/DOUBLE
    Real,
    /// BOOLEAN
    Boolean,
    /// VARCHAR and anything we pass through as text (binary, variant, ...)
    Text,
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP_NTZ
    TimestampNtz,
    /// TIMESTAMP_LTZ
    TimestampLtz,
    /// TIMESTAMP_TZ
    TimestampTz,
}

impl ColumnType {
    /// Maps a SQL API `rowType[].type` name (case-insensitive) to a column type.
    ///
    /// Unknown and semi-structured types are treated as text.
    pub fn from_api(type_name: &str, scale: Option<u32>) -> Self {
        match type_name.to_ascii_lowercase().as_str() {
            "fixed" => ColumnType::Fixed {
                scale: scale.unwrap_or(0),
            },
            "real" => ColumnType::Real,
            "boolean" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "time" => ColumnType::Time,
            "timestamp_ntz" => ColumnType::TimestampNtz,
            "timestamp_ltz" => ColumnType::TimestampLtz,
            "timestamp_tz" => ColumnType::TimestampTz,
            _ => ColumnType::Text,
        }
    }
}

/// One result column: the name exactly as the query returned it, and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name with the warehouse's casing
    pub name: String,
    /// Column type
    pub column_type: ColumnType,
}

impl Column {
    /// Creates a column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A decoded warehouse scalar, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL NULL
    Null,
    /// BOOLEAN
    Bool(bool),
    /// NUMBER with scale 0 that fits in i64
    Integer(i64),
    /// Any other NUMBER
    Decimal(Decimal),
    /// FLOAT/DOUBLE
    Float(f64),
    /// Text and pass-through types
    Text(String),
    /// DATE
    Date(NaiveDate),
    /// TIME
    Time(NaiveTime),
    /// TIMESTAMP_NTZ
    Timestamp(NaiveDateTime),
    /// TIMESTAMP_LTZ / TIMESTAMP_TZ
    TimestampTz(DateTime<FixedOffset>),
}

impl RawValue {
    /// Renders the value as a CSV field.
    ///
    /// Decimals keep their exact warehouse text, temporal values use ISO-8601,
    /// and null becomes the empty field.
    pub fn to_csv_field(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Decimal(d) => d.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::Text(s) => s.clone(),
            RawValue::Date(_)
            | RawValue::Time(_)
            | RawValue::Timestamp(_)
            | RawValue::TimestampTz(_) => self.iso8601().unwrap_or_default(),
        }
    }

    /// ISO-8601 text for temporal values, `None` for everything else.
    pub fn iso8601(&self) -> Option<String> {
        match self {
            RawValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            RawValue::Time(t) => Some(t.format(clock_format(t.nanosecond())).to_string()),
            RawValue::Timestamp(ts) => Some(format!(
                "{}T{}",
                ts.format("%Y-%m-%d"),
                ts.format(clock_format(ts.nanosecond()))
            )),
            RawValue::TimestampTz(ts) => Some(format!(
                "{}T{}{}",
                ts.format("%Y-%m-%d"),
                ts.format(clock_format(ts.nanosecond())),
                ts.format("%:z")
            )),
            _ => None,
        }
    }
}

/// Whole seconds, or microseconds when there is a sub-second part.
/// Anything below a microsecond is truncated.
fn clock_format(nanos: u32) -> &'static str {
    if nanos / 1_000 == 0 {
        "%H:%M:%S"
    } else {
        "%H:%M:%S%.6f"
    }
}

/// A fetched result: column metadata plus rows in query order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Columns in query order
    pub columns: Vec<Column>,
    /// Rows; every row has one value per column
    pub rows: Vec<Vec<RawValue>>,
}

impl ResultSet {
    /// Creates a result set with no rows.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decodes one SQL API cell according to its column type.
///
/// # Errors
///
/// Returns a description of the problem when the text does not match the
/// encoding of the column type.
pub fn decode_cell(cell: Option<&str>, column_type: &ColumnType) -> Result<RawValue, String> {
    let Some(text) = cell else {
        return Ok(RawValue::Null);
    };

    match column_type {
        ColumnType::Text => Ok(RawValue::Text(text.to_string())),
        ColumnType::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(RawValue::Bool(true)),
            "false" | "0" => Ok(RawValue::Bool(false)),
            _ => Err(format!("invalid boolean '{}'", text)),
        },
        ColumnType::Fixed { scale } => decode_fixed(text, *scale),
        ColumnType::Real => decode_real(text),
        ColumnType::Date => {
            let days: i64 = text
                .parse()
                .map_err(|_| format!("invalid date '{}'", text))?;
            NaiveDate::from_ymd_opt(1970, 1, 1)
                .zip(Duration::try_days(days))
                .and_then(|(epoch, delta)| epoch.checked_add_signed(delta))
                .map(RawValue::Date)
                .ok_or_else(|| format!("date out of range '{}'", text))
        }
        ColumnType::Time => {
            let (secs, nanos) =
                parse_epoch_seconds(text).ok_or_else(|| format!("invalid time '{}'", text))?;
            u32::try_from(secs)
                .ok()
                .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
                .map(RawValue::Time)
                .ok_or_else(|| format!("time out of range '{}'", text))
        }
        ColumnType::TimestampNtz => {
            let utc = decode_epoch(text)?;
            Ok(RawValue::Timestamp(utc.naive_utc()))
        }
        ColumnType::TimestampLtz => {
            let utc = decode_epoch(text)?;
            Ok(RawValue::TimestampTz(utc.fixed_offset()))
        }
        ColumnType::TimestampTz => {
            let (epoch, offset) = text
                .split_once(' ')
                .ok_or_else(|| format!("invalid timestamp_tz '{}'", text))?;
            let biased: i32 = offset
                .trim()
                .parse()
                .map_err(|_| format!("invalid timestamp_tz offset '{}'", text))?;
            let offset = FixedOffset::east_opt((biased - TIMESTAMP_TZ_OFFSET_BIAS) * 60)
                .ok_or_else(|| format!("timestamp_tz offset out of range '{}'", text))?;
            let utc = decode_epoch(epoch)?;
            Ok(RawValue::TimestampTz(utc.with_timezone(&offset)))
        }
    }
}

fn decode_fixed(text: &str, scale: u32) -> Result<RawValue, String> {
    if scale == 0 {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(RawValue::Integer(i));
        }
    }
    match Decimal::from_str(text) {
        Ok(d) => Ok(RawValue::Decimal(d)),
        // NUMBER(38, s) can exceed the 96-bit decimal mantissa; it is coerced
        // to f64 anyway, so keep the nearest float.
        Err(_) => text
            .parse::<f64>()
            .map(RawValue::Float)
            .map_err(|_| format!("invalid number '{}'", text)),
    }
}

fn decode_real(text: &str) -> Result<RawValue, String> {
    match text {
        "NaN" | "nan" => Ok(RawValue::Float(f64::NAN)),
        "inf" | "Infinity" => Ok(RawValue::Float(f64::INFINITY)),
        "-inf" | "-Infinity" => Ok(RawValue::Float(f64::NEG_INFINITY)),
        _ => text
            .parse::<f64>()
            .map(RawValue::Float)
            .map_err(|_| format!("invalid float '{}'", text)),
    }
}

fn decode_epoch(text: &str) -> Result<DateTime<Utc>, String> {
    let (secs, nanos) =
        parse_epoch_seconds(text).ok_or_else(|| format!("invalid timestamp '{}'", text))?;
    DateTime::from_timestamp(secs, nanos).ok_or_else(|| format!("timestamp out of range '{}'", text))
}

/// Splits `"<seconds>[.<fraction>]"` into whole seconds and non-negative nanoseconds.
///
/// Negative values are floored: `-1.25` becomes `(-2, 750_000_000)`.
fn parse_epoch_seconds(text: &str) -> Option<(i64, u32)> {
    let text = text.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let negative = whole.starts_with('-');
    let secs: i64 = whole.parse().ok()?;
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<9}", fraction).parse().ok()?
    };

    if negative && nanos > 0 {
        Some((secs - 1, 1_000_000_000 - nanos))
    } else {
        Some((secs, nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_from_api() {
        assert_eq!(
            ColumnType::from_api("FIXED", Some(2)),
            ColumnType::Fixed { scale: 2 }
        );
        assert_eq!(
            ColumnType::from_api("fixed", None),
            ColumnType::Fixed { scale: 0 }
        );
        assert_eq!(ColumnType::from_api("timestamp_tz", None), ColumnType::TimestampTz);
        assert_eq!(ColumnType::from_api("variant", None), ColumnType::Text);
        assert_eq!(ColumnType::from_api("binary", None), ColumnType::Text);
    }

    #[test]
    fn test_decode_null() {
        assert_eq!(decode_cell(None, &ColumnType::Date), Ok(RawValue::Null));
    }

    #[test]
    fn test_decode_fixed() {
        assert_eq!(
            decode_cell(Some("42"), &ColumnType::Fixed { scale: 0 }),
            Ok(RawValue::Integer(42))
        );
        assert_eq!(
            decode_cell(Some("189.50"), &ColumnType::Fixed { scale: 2 }),
            Ok(RawValue::Decimal(Decimal::from_str("189.50").unwrap()))
        );
        // Larger than i64 but within the decimal range.
        assert!(matches!(
            decode_cell(
                Some("99999999999999999999"),
                &ColumnType::Fixed { scale: 0 }
            ),
            Ok(RawValue::Decimal(_))
        ));
        // Beyond the decimal range falls back to a float.
        assert!(matches!(
            decode_cell(
                Some("99999999999999999999999999999999999999"),
                &ColumnType::Fixed { scale: 0 }
            ),
            Ok(RawValue::Float(_))
        ));
        assert!(decode_cell(Some("abc"), &ColumnType::Fixed { scale: 0 }).is_err());
    }

    #[test]
    fn test_decode_real_special_values() {
        assert_eq!(
            decode_cell(Some("1.5"), &ColumnType::Real),
            Ok(RawValue::Float(1.5))
        );
        match decode_cell(Some("NaN"), &ColumnType::Real) {
            Ok(RawValue::Float(f)) => assert!(f.is_nan()),
            other => panic!("expected NaN, got {:?}", other),
        }
        assert_eq!(
            decode_cell(Some("-inf"), &ColumnType::Real),
            Ok(RawValue::Float(f64::NEG_INFINITY))
        );
    }

    #[test]
    fn test_decode_boolean() {
        assert_eq!(
            decode_cell(Some("true"), &ColumnType::Boolean),
            Ok(RawValue::Bool(true))
        );
        assert_eq!(
            decode_cell(Some("FALSE"), &ColumnType::Boolean),
            Ok(RawValue::Bool(false))
        );
        assert!(decode_cell(Some("maybe"), &ColumnType::Boolean).is_err());
    }

    #[test]
    fn test_decode_date_from_epoch_days() {
        // 2025-01-02 is 20090 days after 1970-01-01
        assert_eq!(
            decode_cell(Some("20090"), &ColumnType::Date),
            Ok(RawValue::Date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()))
        );
        assert_eq!(
            decode_cell(Some("-1"), &ColumnType::Date),
            Ok(RawValue::Date(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()))
        );
    }

    #[test]
    fn test_decode_time() {
        assert_eq!(
            decode_cell(Some("82919.000000000"), &ColumnType::Time),
            Ok(RawValue::Time(NaiveTime::from_hms_opt(23, 1, 59).unwrap()))
        );
        assert!(decode_cell(Some("-5.0"), &ColumnType::Time).is_err());
    }

    #[test]
    fn test_decode_timestamp_ntz() {
        let value = decode_cell(Some("1735813800.250000000"), &ColumnType::TimestampNtz).unwrap();
        assert_eq!(
            value.iso8601().as_deref(),
            Some("2025-01-02T10:30:00.250000")
        );
    }

    #[test]
    fn test_fractional_seconds_render_as_microseconds() {
        let time = decode_cell(Some("37800.000125000"), &ColumnType::Time).unwrap();
        assert_eq!(time.iso8601().as_deref(), Some("10:30:00.000125"));

        // Below a microsecond there is nothing to show.
        let ts = decode_cell(Some("1735813800.000000999"), &ColumnType::TimestampNtz).unwrap();
        assert_eq!(ts.iso8601().as_deref(), Some("2025-01-02T10:30:00"));

        let tz = decode_cell(Some("1735813800.123456789 1440"), &ColumnType::TimestampTz).unwrap();
        assert_eq!(tz.iso8601().as_deref(), Some("2025-01-02T10:30:00.123456+00:00"));
    }

    #[test]
    fn test_decode_timestamp_tz_removes_offset_bias() {
        // 960 - 1440 = -480 minutes = UTC-08:00
        let value =
            decode_cell(Some("1616173619.000000000 960"), &ColumnType::TimestampTz).unwrap();
        assert_eq!(
            value.iso8601().as_deref(),
            Some("2021-03-19T09:06:59-08:00")
        );
    }

    #[test]
    fn test_decode_timestamp_ltz_is_utc() {
        let value = decode_cell(Some("0"), &ColumnType::TimestampLtz).unwrap();
        assert_eq!(
            value.iso8601().as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_parse_epoch_seconds_negative_fraction() {
        assert_eq!(parse_epoch_seconds("-1.25"), Some((-2, 750_000_000)));
        assert_eq!(parse_epoch_seconds("12"), Some((12, 0)));
        assert_eq!(parse_epoch_seconds("1.5x"), None);
        assert_eq!(parse_epoch_seconds("1.1234567890"), None);
    }

    #[test]
    fn test_csv_field_rendering() {
        assert_eq!(RawValue::Null.to_csv_field(), "");
        assert_eq!(
            RawValue::Decimal(Decimal::from_str("189.50").unwrap()).to_csv_field(),
            "189.50"
        );
        assert_eq!(
            RawValue::Date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()).to_csv_field(),
            "2025-01-02"
        );
        assert_eq!(RawValue::Bool(true).to_csv_field(), "true");
    }
}
