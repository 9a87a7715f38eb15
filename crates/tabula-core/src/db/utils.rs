//! Parameter binding and row extraction helpers.

use rusqlite::{Row as SqliteRow, Statement};

use crate::{
    error::{DatabaseResultExt, Result},
    value::{SqlRow, SqlValue},
};

/// Binds every parameter the statement actually mentions.
///
/// Parameters without a matching `:name` placeholder are skipped, so a
/// caller-supplied statement may ignore part of the filter it was given.
pub(crate) fn bind_named(stmt: &mut Statement<'_>, params: &SqlRow) -> Result<()> {
    for (name, value) in params {
        let placeholder = format!(":{name}");
        let index = stmt
            .parameter_index(&placeholder)
            .db_context_lazy(|| format!("Invalid parameter name {placeholder}"))?;
        if let Some(index) = index {
            stmt.raw_bind_parameter(index, value)
                .db_context_lazy(|| format!("Failed to bind {placeholder}"))?;
        }
    }
    Ok(())
}

/// Reads a result row into a column-name keyed map.
pub(crate) fn read_row(row: &SqliteRow<'_>, columns: &[String]) -> rusqlite::Result<SqlRow> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| Ok((name.clone(), row.get::<_, SqlValue>(i)?)))
        .collect()
}

/// Quotes a literal for DDL contexts such as `DEFAULT` clauses, where
/// parameters cannot be bound.
pub(crate) fn sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        // SQL has no literal for NaN or infinities
        SqlValue::Real(r) if !r.is_finite() => "NULL".to_string(),
        SqlValue::Real(r) => format!("{r:?}"),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}
