//! Application-side values and row mappings.
//!
//! A [`Value`] is what callers read and write. The database side uses
//! [`SqlValue`] (rusqlite's owned value type); the [`crate::convert`] module
//! moves rows between the two using a table schema.

use std::fmt;

use indexmap::IndexMap;
use jiff::{civil, tz::TimeZone, Timestamp, Unit};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TabulaError},
    types::SemanticType,
};

/// Owned database-side value.
pub type SqlValue = rusqlite::types::Value;

/// Application-side row: column name to value, in a meaningful order.
pub type Row = IndexMap<String, Value>;

/// Database-side row: column (or placeholder) name to bound value.
pub type SqlRow = IndexMap<String, SqlValue>;

/// A single application-side scalar.
///
/// `Null` is the "not available" state. It is distinct from `Boolean(false)`
/// and from `Text("")`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Date(civil::Date),
    DateTime(Timestamp),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Casts this value to the representation of `ty`, staying on the
    /// application side.
    ///
    /// `DateTime` results are rounded to the microsecond.
    ///
    /// Returns `None` when the cast is not representable, for example a
    /// non-numeric string into [`SemanticType::Integer`]. `Null` casts to
    /// `Null` for every type.
    pub fn coerce(&self, ty: SemanticType) -> Option<Value> {
        if self.is_null() {
            return Some(Value::Null);
        }

        match ty {
            SemanticType::Text => Some(Value::Text(self.to_string())),
            SemanticType::Integer => match self {
                Value::Integer(i) => Some(Value::Integer(*i)),
                Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                    Some(Value::Integer(*n as i64))
                }
                Value::Boolean(b) => Some(Value::Integer(i64::from(*b))),
                Value::Text(s) => s.trim().parse().ok().map(Value::Integer),
                _ => None,
            },
            SemanticType::Number => match self {
                Value::Integer(i) => Some(Value::Number(*i as f64)),
                Value::Number(n) => Some(Value::Number(*n)),
                Value::Text(s) => s.trim().parse().ok().map(Value::Number),
                _ => None,
            },
            SemanticType::Boolean => match self {
                Value::Boolean(b) => Some(Value::Boolean(*b)),
                Value::Integer(0) => Some(Value::Boolean(false)),
                Value::Integer(1) => Some(Value::Boolean(true)),
                Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(Value::Boolean(true)),
                    "false" | "0" => Some(Value::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            SemanticType::Date => match self {
                Value::Date(d) => Some(Value::Date(*d)),
                Value::DateTime(ts) => Some(Value::Date(ts.to_zoned(TimeZone::UTC).date())),
                Value::Text(s) => s.trim().parse().ok().map(Value::Date),
                _ => None,
            },
            SemanticType::DateTime => {
                let ts = match self {
                    Value::DateTime(ts) => Some(*ts),
                    Value::Date(d) => d.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp()),
                    Value::Text(s) => parse_timestamp(s.trim()),
                    _ => None,
                }?;
                // Storage keeps microseconds
                ts.round(Unit::Microsecond).ok().map(Value::DateTime)
            }
        }
    }

    /// Builds a value from a JSON scalar, as found in schema `defaults`.
    pub fn from_json(field: &str, json: &serde_json::Value) -> Result<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => n.as_f64().map(Value::Number).ok_or_else(|| {
                    TabulaError::invalid_input(field).with_reason(format!("unsupported number {n}"))
                }),
            },
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            other => Err(TabulaError::invalid_input(field)
                .with_reason(format!("expected a scalar, found {other}"))),
        }
    }
}

/// Parses RFC 3339 timestamps, falling back to a zone-less civil datetime
/// (`2024-03-01 12:30:00`) interpreted as UTC.
fn parse_timestamp(s: &str) -> Option<Timestamp> {
    s.parse::<Timestamp>().ok().or_else(|| {
        s.parse::<civil::DateTime>()
            .ok()
            .and_then(|dt| dt.to_zoned(TimeZone::UTC).ok())
            .map(|z| z.timestamp())
    })
}

impl From<SqlValue> for Value {
    /// Raw mapping used when no schema is available. Blobs are decoded as
    /// lossy UTF-8 text.
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(i) => Value::Integer(i),
            SqlValue::Real(r) => Value::Number(r),
            SqlValue::Text(s) => Value::Text(s),
            SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<civil::Date> for Value {
    fn from(d: civil::Date) -> Self {
        Value::Date(d)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::DateTime(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(ts) => write!(f, "{ts}"),
        }
    }
}

/// Builds a [`Row`] from `column => value` pairs.
///
/// ```rust
/// use tabula_core::{row, Value};
///
/// let r = row! { "userid" => "u1", "age" => 47 };
/// assert_eq!(r["age"], Value::Integer(47));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        row
    }};
}
