//! Database collaborator: the [`Backend`] contract and its SQLite
//! implementation.
//!
//! The core never talks to rusqlite directly. Everything it needs from the
//! database goes through [`Backend`], which [`Database`] implements over a
//! single `rusqlite::Connection`. Backend errors are carried unchanged as
//! the source of [`crate::TabulaError::Database`].

use std::path::Path;

use rusqlite::Connection;

use crate::{
    error::{DatabaseResultExt, Result},
    value::SqlRow,
};

pub mod queries;
pub mod utils;

/// Operations the core requires from a database connection.
///
/// Implementations decide their own concurrency contract; the core adds no
/// locking of its own and performs one call per CRUD operation.
pub trait Backend {
    /// Executes a statement with named parameters and returns the number of
    /// affected rows.
    fn execute(&self, sql: &str, params: &SqlRow) -> Result<usize>;

    /// Runs a query and returns every row, columns in result order.
    fn fetch_all(&self, sql: &str, params: &SqlRow) -> Result<Vec<SqlRow>>;

    fn table_exists(&self, table: &str) -> Result<bool>;

    fn drop_table(&self, table: &str) -> Result<()>;

    /// Appends many rows in one call. Every row is bound by column name
    /// using the columns of the first row.
    fn bulk_append(&self, table: &str, rows: &[SqlRow]) -> Result<usize>;

    /// The key generated by the most recent insert on this connection, or
    /// `None` when the last statement wrote no rows. Called right after
    /// the insert it reports on.
    fn last_generated_key(&self) -> Result<Option<i64>>;

    /// Column names of a live table, in physical order.
    fn table_columns(&self, table: &str) -> Result<Vec<String>>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn execute(&self, sql: &str, params: &SqlRow) -> Result<usize> {
        (**self).execute(sql, params)
    }

    fn fetch_all(&self, sql: &str, params: &SqlRow) -> Result<Vec<SqlRow>> {
        (**self).fetch_all(sql, params)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        (**self).table_exists(table)
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        (**self).drop_table(table)
    }

    fn bulk_append(&self, table: &str, rows: &[SqlRow]) -> Result<usize> {
        (**self).bulk_append(table, rows)
    }

    fn last_generated_key(&self) -> Result<Option<i64>> {
        (**self).last_generated_key()
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        (**self).table_columns(table)
    }
}

/// SQLite connection implementing [`Backend`].
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens (or creates) the database file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        Self::from_connection(connection)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;
        Self::from_connection(connection)
    }

    /// Wraps an existing connection.
    pub fn from_connection(connection: Connection) -> Result<Self> {
        connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;
        Ok(Self { connection })
    }

    /// The underlying connection, for transactions and ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}
