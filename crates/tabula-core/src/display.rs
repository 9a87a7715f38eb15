//! Markdown rendering of fetched rows.
//!
//! Values, semantic types, schemas and statements implement
//! [`std::fmt::Display`] themselves; this module adds the wrapper for
//! collections of rows.

use std::{fmt, ops::Index};

use indexmap::IndexSet;

use crate::value::{Row, Value};

/// Newtype wrapper for displaying fetched rows as a markdown table.
///
/// The header is the union of every row's columns in first-seen order; a
/// row lacking a column shows an empty cell.
///
/// # Examples
///
/// ```rust
/// use tabula_core::{display::RowsTable, row};
///
/// let rows = RowsTable(vec![
///     row! { "userid" => "u1", "age" => 47 },
///     row! { "userid" => "u2", "age" => None::<i64> },
/// ]);
///
/// let output = rows.to_string();
/// assert!(output.starts_with("| userid | age |"));
/// assert!(output.contains("| u2 | NULL |"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowsTable(pub Vec<Row>);

impl RowsTable {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.0.iter()
    }

    /// Column names across all rows, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let columns: IndexSet<&str> = self
            .0
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        columns.into_iter().collect()
    }
}

impl From<Vec<Row>> for RowsTable {
    fn from(rows: Vec<Row>) -> Self {
        Self(rows)
    }
}

impl Index<usize> for RowsTable {
    type Output = Row;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for RowsTable {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowsTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for RowsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No rows found.");
        }

        let columns = self.columns();
        writeln!(f, "| {} |", columns.join(" | "))?;
        writeln!(f, "|{}", " --- |".repeat(columns.len()))?;

        for row in &self.0 {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| row.get(*column).map_or_else(String::new, cell))
                .collect();
            writeln!(f, "| {} |", cells.join(" | "))?;
        }
        Ok(())
    }
}

fn cell(value: &Value) -> String {
    value.to_string().replace('|', "\\|").replace('\n', " ")
}
