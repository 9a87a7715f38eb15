//! Parameterized SQL generation for get, insert, update and delete.
//!
//! Every placeholder is named after its column (`:userid`), and parameters
//! are kept in the order the clauses list them. Callers that need the same
//! column in both the `SET` and `WHERE` clauses of an update must rename
//! one side themselves; the builder does not disambiguate and the filter's
//! binding wins.
//!
//! An empty filter on [`Statement::update`] or [`Statement::delete`]
//! produces a statement that touches every row of the table.

use std::fmt;

use log::debug;

use crate::{
    error::{Result, TabulaError},
    value::SqlRow,
};

/// Whether an insert fails on conflicts or replaces the conflicting row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    #[default]
    Insert,
    Replace,
}

impl InsertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertMode::Insert => "INSERT",
            InsertMode::Replace => "REPLACE",
        }
    }
}

/// SQL text with named placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: SqlRow,
}

impl Statement {
    /// Uses caller-supplied SQL verbatim with `params` as bindings.
    pub fn explicit(sql: impl Into<String>, params: SqlRow) -> Self {
        Self::new(sql.into(), params)
    }

    /// `SELECT * FROM table [WHERE ...] [ORDER BY ...]`.
    ///
    /// If `table` already is a select statement it is used as-is, with the
    /// filter bound as parameters and nothing appended.
    pub fn select(table: &str, filter: SqlRow, order_by: &[String]) -> Self {
        if is_select(table) {
            return Self::new(table.to_string(), filter);
        }

        let mut sql = format!("SELECT * FROM {table}");
        push_where(&mut sql, &filter);
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }
        Self::new(sql, filter)
    }

    /// `INSERT INTO table VALUES (:a, :b, ...)` in the order of `values`.
    ///
    /// The statement is positional, so `values` must list the table's
    /// columns in physical order.
    pub fn insert(table: &str, values: SqlRow, mode: InsertMode) -> Self {
        let placeholders: Vec<String> = values.keys().map(|k| placeholder(k)).collect();
        let sql = format!(
            "{} INTO {table} VALUES ({})",
            mode.as_str(),
            placeholders.join(", ")
        );
        Self::new(sql, values)
    }

    /// `UPDATE table SET a = :a, ... [WHERE ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`TabulaError::EmptyUpdate`] when `values` is empty.
    pub fn update(table: &str, values: SqlRow, filter: SqlRow) -> Result<Self> {
        if values.is_empty() {
            return Err(TabulaError::EmptyUpdate {
                table: table.to_string(),
            });
        }

        let assignments: Vec<String> = values.keys().map(|k| equals(k)).collect();
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        push_where(&mut sql, &filter);

        let mut params = values;
        params.extend(filter);
        Ok(Self::new(sql, params))
    }

    /// `DELETE FROM table [WHERE ...]`.
    pub fn delete(table: &str, filter: SqlRow) -> Self {
        let mut sql = format!("DELETE FROM {table}");
        push_where(&mut sql, &filter);
        Self::new(sql, filter)
    }

    fn new(sql: String, params: SqlRow) -> Self {
        debug!("statement: {sql}");
        Self { sql, params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder name (without the leading colon) to bound value.
    pub fn params(&self) -> &SqlRow {
        &self.params
    }

    pub fn into_parts(self) -> (String, SqlRow) {
        (self.sql, self.params)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        for (name, value) in &self.params {
            write!(f, "\n  :{name} = {value:?}")?;
        }
        Ok(())
    }
}

/// Whether `table` is a complete select statement rather than a table name.
pub fn is_select(table: &str) -> bool {
    table
        .trim_start()
        .get(..7)
        .is_some_and(|head| head.eq_ignore_ascii_case("select "))
}

fn placeholder(column: &str) -> String {
    format!(":{column}")
}

fn equals(column: &str) -> String {
    format!("{column} = :{column}")
}

fn push_where(sql: &mut String, filter: &SqlRow) {
    if filter.is_empty() {
        return;
    }
    let terms: Vec<String> = filter.keys().map(|k| equals(k)).collect();
    sql.push_str(" WHERE ");
    sql.push_str(&terms.join(" AND "));
}
