//! Conversion between application rows and database rows.
//!
//! Both directions walk the schema's columns in physical order, so output
//! rows are always ordered the way the table is declared regardless of how
//! the input was ordered. Input keys the schema does not know are dropped.
//!
//! Temporal columns are stored as numbers: a `DATE` is the number of days
//! since the date origin and a `DATETIME` is the number of microseconds
//! since midnight UTC of the origin. `DATETIME` values are rounded to the
//! microsecond before they are stored; a `REAL` read from a `DATETIME`
//! column is taken as seconds. Booleans are stored as 0/1 integers and
//! `NULL` stays a third state.

use jiff::{civil, tz::TimeZone, SignedDuration, Span, Timestamp, Unit};
use log::trace;

use crate::{
    error::{Result, TabulaError},
    schema::TableSchema,
    types::SemanticType,
    value::{Row, SqlRow, SqlValue, Value},
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Options shared by both conversion directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Process every schema column instead of only those present in the
    /// input. Missing columns take their declared default, or null.
    pub include_missing: bool,
    /// Replace nulls with the semantic type's empty value.
    pub null_as_empty: bool,
    /// Anchor for numeric date storage.
    pub date_origin: civil::Date,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_missing: false,
            null_as_empty: false,
            date_origin: civil::date(1970, 1, 1),
        }
    }
}

impl ConvertOptions {
    /// Options for the insert path: every column, in physical order.
    pub fn insert() -> Self {
        Self {
            include_missing: true,
            ..Self::default()
        }
    }

    pub fn with_include_missing(mut self, include_missing: bool) -> Self {
        self.include_missing = include_missing;
        self
    }

    pub fn with_null_as_empty(mut self, null_as_empty: bool) -> Self {
        self.null_as_empty = null_as_empty;
        self
    }

    pub fn with_date_origin(mut self, date_origin: civil::Date) -> Self {
        self.date_origin = date_origin;
        self
    }

    fn origin_timestamp(&self) -> Result<Timestamp> {
        self.date_origin
            .to_zoned(TimeZone::UTC)
            .map(|z| z.timestamp())
            .map_err(|e| TabulaError::Configuration {
                message: format!("Invalid date origin {}: {e}", self.date_origin),
            })
    }
}

/// Converts an application row into database values for `schema`.
///
/// # Errors
///
/// Returns [`TabulaError::Conversion`] naming the column when a value cannot
/// be cast to the column's semantic type. No partial row is returned.
pub fn to_database(values: &Row, schema: &TableSchema, options: &ConvertOptions) -> Result<SqlRow> {
    let origin = options.origin_timestamp()?;
    let mut out = SqlRow::with_capacity(schema.columns().len());

    for (column, &ty) in schema.semantic_types() {
        let mut value = match values.get(column) {
            Some(value) => value.clone(),
            None if options.include_missing => {
                schema.default_for(column).cloned().unwrap_or(Value::Null)
            }
            None => continue,
        };

        if value.is_null() && options.null_as_empty {
            value = ty.empty_value();
        }

        let typed = value
            .coerce(ty)
            .ok_or_else(|| TabulaError::conversion(column, &value, ty))?;
        out.insert(column.clone(), encode(typed, origin));
    }

    trace!("converted {} column(s) of '{}' to database values", out.len(), schema.name());
    Ok(out)
}

/// Converts a fetched database row into application values for `schema`.
///
/// A stored `NULL` in a temporal column becomes the empty value of the
/// column's type, never the date origin itself.
///
/// # Errors
///
/// Returns [`TabulaError::Conversion`] when a stored value does not fit the
/// column's semantic type, for example text in an `INTEGER` column.
pub fn to_application(values: &SqlRow, schema: &TableSchema, options: &ConvertOptions) -> Result<Row> {
    let origin = options.origin_timestamp()?;
    let mut out = Row::with_capacity(schema.columns().len());

    for (column, &ty) in schema.semantic_types() {
        let raw = match values.get(column) {
            Some(raw) => raw,
            None if options.include_missing => &SqlValue::Null,
            None => continue,
        };

        let value = match raw {
            SqlValue::Null if options.null_as_empty => ty.empty_value(),
            SqlValue::Null => Value::Null,
            raw => decode(column, raw, ty, origin, options.date_origin)?,
        };
        out.insert(column.clone(), value);
    }

    Ok(out)
}

/// Converts every fetched row; see [`to_application`].
pub fn rows_to_application(
    rows: &[SqlRow],
    schema: &TableSchema,
    options: &ConvertOptions,
) -> Result<Vec<Row>> {
    rows.iter()
        .map(|row| to_application(row, schema, options))
        .collect()
}

/// Converts a row without a schema, encoding each value by its own kind.
///
/// Used to bind filters as-is. Temporal values still become offsets from
/// the date origin so they compare equal to stored values.
pub fn to_database_raw(values: &Row, options: &ConvertOptions) -> Result<SqlRow> {
    let origin = options.origin_timestamp()?;
    Ok(values
        .iter()
        .map(|(column, value)| (column.clone(), encode(value.clone(), origin)))
        .collect())
}

fn encode(value: Value, origin: Timestamp) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Text(s) => SqlValue::Text(s),
        Value::Integer(i) => SqlValue::Integer(i),
        Value::Number(n) => SqlValue::Real(n),
        Value::Boolean(b) => SqlValue::Integer(i64::from(b)),
        Value::Date(d) => {
            let origin_date = origin.to_zoned(TimeZone::UTC).date();
            SqlValue::Integer(d.duration_since(origin_date).as_secs() / SECONDS_PER_DAY)
        }
        Value::DateTime(ts) => {
            let ts = ts.round(Unit::Microsecond).unwrap_or(ts);
            // Any two instants in jiff's range are within i64 microseconds
            let micros = ts.duration_since(origin).as_micros();
            SqlValue::Integer(micros.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
        }
    }
}

fn decode(
    column: &str,
    raw: &SqlValue,
    ty: SemanticType,
    origin: Timestamp,
    origin_date: civil::Date,
) -> Result<Value> {
    let fail = || TabulaError::conversion(column, raw, ty);

    match (ty, raw) {
        (_, SqlValue::Blob(_)) => Err(fail()),
        (SemanticType::Date, SqlValue::Integer(days)) => add_days(origin_date, *days).ok_or_else(fail),
        (SemanticType::Date, SqlValue::Real(days)) if days.is_finite() => {
            add_days(origin_date, days.floor() as i64).ok_or_else(fail)
        }
        (SemanticType::DateTime, SqlValue::Integer(micros)) => {
            add_micros(origin, i128::from(*micros)).ok_or_else(fail)
        }
        (SemanticType::DateTime, SqlValue::Real(secs)) if secs.is_finite() => {
            add_micros(origin, (secs * 1e6).round() as i128).ok_or_else(fail)
        }
        (_, raw) => Value::from(raw.clone()).coerce(ty).ok_or_else(fail),
    }
}

fn add_days(origin: civil::Date, days: i64) -> Option<Value> {
    let span = Span::new().try_days(days).ok()?;
    origin.checked_add(span).ok().map(Value::Date)
}

fn add_micros(origin: Timestamp, micros: i128) -> Option<Value> {
    let micros = i64::try_from(micros).ok()?;
    origin
        .checked_add(SignedDuration::from_micros(micros))
        .ok()
        .map(Value::DateTime)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use jiff::civil::date;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::row;

    fn user_schema() -> TableSchema {
        TableSchema::from_columns(
            "user",
            [
                ("userid", "VARCHAR(20)"),
                ("email", "VARCHAR(100)"),
                ("age", "INTEGER"),
                ("female", "BOOLEAN"),
                ("created", "DATETIME"),
                ("descr", "TEXT"),
            ],
        )
        .unwrap()
    }

    fn all_types_schema() -> TableSchema {
        TableSchema::from_columns(
            "t",
            [
                ("txt", "TEXT"),
                ("int", "INTEGER"),
                ("num", "REAL"),
                ("flag", "BOOLEAN"),
                ("day", "DATE"),
                ("at", "DATETIME"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_insert_path_reorders_and_prunes() {
        let created: Timestamp = "2024-05-01T08:30:00Z".parse().unwrap();
        let input = row! {
            "age" => 47,
            "female" => true,
            "email" => "a@b.com",
            "userid" => "u1",
            "created" => created,
            "gender" => "female",
        };

        let out = to_database(&input, &user_schema(), &ConvertOptions::insert().with_null_as_empty(true))
            .unwrap();

        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, ["userid", "email", "age", "female", "created", "descr"]);
        assert_eq!(out["descr"], SqlValue::Text(String::new()));
        assert_eq!(out["female"], SqlValue::Integer(1));
        assert_eq!(
            out["created"],
            SqlValue::Integer(created.as_second() * 1_000_000)
        );
        assert!(!out.contains_key("gender"));
    }

    #[test]
    fn test_update_path_keeps_only_present_columns() {
        let out = to_database(
            &row! { "age" => "48", "userid" => "u1" },
            &user_schema(),
            &ConvertOptions::default(),
        )
        .unwrap();

        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, ["userid", "age"]);
        assert_eq!(out["age"], SqlValue::Integer(48));
    }

    #[test]
    fn test_round_trip_with_nulls() {
        let schema = all_types_schema();
        let options = ConvertOptions::insert();
        let rows = [
            row! {
                "txt" => "hello",
                "int" => 42,
                "num" => 2.5,
                "flag" => false,
                "day" => date(1969, 7, 20),
                "at" => "2001-09-09T01:46:40.5Z".parse::<Timestamp>().unwrap(),
            },
            row! {
                "txt" => Value::Null,
                "int" => Value::Null,
                "num" => Value::Null,
                "flag" => Value::Null,
                "day" => Value::Null,
                "at" => Value::Null,
            },
            row! {
                "txt" => "",
                "int" => -7,
                "num" => Value::Null,
                "flag" => true,
                "day" => date(2024, 2, 29),
                "at" => Value::Null,
            },
        ];

        for original in rows {
            let stored = to_database(&original, &schema, &options).unwrap();
            let back = to_application(&stored, &schema, &options).unwrap();
            assert_eq!(back, original);
        }
    }

    #[test]
    fn test_datetime_keeps_microseconds_far_from_origin() {
        let schema = all_types_schema();
        let options = ConvertOptions::default();

        for at in ["9000-12-31T23:59:59.123457Z", "0001-01-01T00:00:00.000001Z"] {
            let original = row! { "at" => at.parse::<Timestamp>().unwrap() };
            let stored = to_database(&original, &schema, &options).unwrap();
            assert!(matches!(stored["at"], SqlValue::Integer(_)));
            assert_eq!(to_application(&stored, &schema, &options).unwrap(), original);
        }
    }

    #[test]
    fn test_datetime_rounds_nanoseconds_before_storing() {
        let schema = all_types_schema();
        let options = ConvertOptions::default();
        let precise: Timestamp = "2024-05-01T08:30:00.000000501Z".parse().unwrap();

        let stored = to_database(&row! { "at" => precise }, &schema, &options).unwrap();
        let back = to_application(&stored, &schema, &options).unwrap();

        let rounded: Timestamp = "2024-05-01T08:30:00.000001Z".parse().unwrap();
        assert_eq!(back["at"], Value::DateTime(rounded));
        assert_eq!(
            Value::DateTime(precise).coerce(SemanticType::DateTime),
            Some(Value::DateTime(rounded))
        );

        // Storing what was read back is stable
        let again = to_database(&back, &schema, &options).unwrap();
        assert_eq!(again, stored);
    }

    #[test]
    fn test_real_datetime_is_read_as_seconds() {
        let stored: SqlRow = IndexMap::from([("at".to_string(), SqlValue::Real(1.5))]);
        let out = to_application(&stored, &all_types_schema(), &ConvertOptions::default()).unwrap();
        assert_eq!(
            out["at"],
            Value::DateTime("1970-01-01T00:00:01.5Z".parse().unwrap())
        );
    }

    #[test]
    fn test_date_origin_reconstruction() {
        let schema = all_types_schema();
        let stored: SqlRow = IndexMap::from([
            ("at".to_string(), SqlValue::Integer(0)),
            ("day".to_string(), SqlValue::Null),
        ]);

        let out = to_application(&stored, &schema, &ConvertOptions::default()).unwrap();
        assert_eq!(out["at"], Value::DateTime(Timestamp::UNIX_EPOCH));
        assert_eq!(out["day"], Value::Null);

        let shifted = ConvertOptions::default().with_date_origin(date(2000, 1, 1));
        let stored: SqlRow = IndexMap::from([("day".to_string(), SqlValue::Integer(31))]);
        let out = to_application(&stored, &schema, &shifted).unwrap();
        assert_eq!(out["day"], Value::Date(date(2000, 2, 1)));
    }

    #[test]
    fn test_null_as_empty_on_read() {
        let schema = all_types_schema();
        let stored: SqlRow = IndexMap::from([
            ("txt".to_string(), SqlValue::Null),
            ("day".to_string(), SqlValue::Null),
        ]);

        let out = to_application(&stored, &schema, &ConvertOptions::default().with_null_as_empty(true))
            .unwrap();
        assert_eq!(out["txt"], Value::from(""));
        assert_eq!(out["day"], Value::Null);
    }

    #[test]
    fn test_temporal_text_is_accepted_on_read() {
        let stored: SqlRow = IndexMap::from([
            ("day".to_string(), SqlValue::Text("2023-12-24".into())),
            ("at".to_string(), SqlValue::Text("2023-12-24 18:00:00".into())),
        ]);

        let out = to_application(&stored, &all_types_schema(), &ConvertOptions::default()).unwrap();
        assert_eq!(out["day"], Value::Date(date(2023, 12, 24)));
        assert_eq!(
            out["at"],
            Value::DateTime("2023-12-24T18:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn test_conversion_error_names_column() {
        let err = to_database(
            &row! { "age" => "forty" },
            &user_schema(),
            &ConvertOptions::default(),
        )
        .unwrap_err();

        match err {
            TabulaError::Conversion { column, value, target } => {
                assert_eq!(column, "age");
                assert!(value.contains("forty"));
                assert_eq!(target, SemanticType::Integer);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blob_is_not_convertible() {
        let stored: SqlRow = IndexMap::from([("txt".to_string(), SqlValue::Blob(vec![1, 2]))]);
        let err = to_application(&stored, &all_types_schema(), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, TabulaError::Conversion { .. }));
    }

    #[test]
    fn test_raw_encoding_keeps_input_order() {
        let out = to_database_raw(
            &row! { "z" => true, "day" => date(1970, 1, 11), "a" => 1.5 },
            &ConvertOptions::default(),
        )
        .unwrap();

        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "day", "a"]);
        assert_eq!(out["z"], SqlValue::Integer(1));
        assert_eq!(out["day"], SqlValue::Integer(10));
        assert_eq!(out["a"], SqlValue::Real(1.5));
    }

    #[test]
    fn test_boolean_keeps_null_distinct() {
        let schema = all_types_schema();
        let stored = to_database(&row! { "flag" => Value::Null }, &schema, &ConvertOptions::default())
            .unwrap();
        assert_eq!(stored["flag"], SqlValue::Null);

        let stored: SqlRow = IndexMap::from([("flag".to_string(), SqlValue::Integer(0))]);
        let out = to_application(&stored, &schema, &ConvertOptions::default()).unwrap();
        assert_eq!(out["flag"], Value::Boolean(false));
    }
}
