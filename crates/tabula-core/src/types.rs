//! Mapping from declared SQL column types to semantic types.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TabulaError},
    value::Value,
};

/// Canonical per-column type derived from a declared SQL type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// `CHAR(n)`, `CHARACTER(n)`, `VARCHAR(n)`, `TEXT`
    Text,
    /// `INTEGER`, including `INTEGER PRIMARY KEY`
    Integer,
    /// `NUMERIC`, `REAL`
    Number,
    /// `BOOLEAN`, stored as 0/1
    Boolean,
    /// `DATE`, stored as days since the date origin
    Date,
    /// `DATETIME`, stored as microseconds since the date origin
    DateTime,
}

/// Classifies a declared column type such as `VARCHAR(100)` or `DATETIME`.
///
/// Matching is case-insensitive and looks only at the leading characters of
/// the declaration, so `INTEGER PRIMARY KEY` classifies as
/// [`SemanticType::Integer`].
///
/// # Errors
///
/// Returns [`TabulaError::UnknownType`] when no prefix matches. The column
/// name is left empty; schema construction fills it in.
pub fn classify(declared: &str) -> Result<SemanticType> {
    let lowered = declared.trim().to_ascii_lowercase();
    let prefix = |p: &str| lowered.starts_with(p);

    if prefix("char") || prefix("text") || prefix("varc") {
        Ok(SemanticType::Text)
    } else if prefix("bool") {
        Ok(SemanticType::Boolean)
    } else if prefix("integ") {
        Ok(SemanticType::Integer)
    } else if prefix("numer") || prefix("real") {
        Ok(SemanticType::Number)
    } else if prefix("datet") {
        Ok(SemanticType::DateTime)
    } else if prefix("date") {
        Ok(SemanticType::Date)
    } else {
        Err(TabulaError::UnknownType {
            column: String::new(),
            declared: declared.to_string(),
        })
    }
}

impl SemanticType {
    /// The "unset" value for this type: an empty string for text, `Null`
    /// for everything else.
    pub fn empty_value(self) -> Value {
        match self {
            SemanticType::Text => Value::Text(String::new()),
            _ => Value::Null,
        }
    }

    /// Lowercase name, as used in error messages and serialized schemas.
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Text => "text",
            SemanticType::Integer => "integer",
            SemanticType::Number => "number",
            SemanticType::Boolean => "boolean",
            SemanticType::Date => "date",
            SemanticType::DateTime => "datetime",
        }
    }

    /// Whether values of this type are stored as an offset from the date
    /// origin.
    pub fn is_temporal(self) -> bool {
        matches!(self, SemanticType::Date | SemanticType::DateTime)
    }
}

impl FromStr for SemanticType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self> {
        classify(s)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
