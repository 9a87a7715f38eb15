#![allow(dead_code)]

use std::cell::RefCell;

use tabula_core::{Backend, Database, Result, SqlRow};
use tempfile::TempDir;

/// Helper function to create a test database in a temporary directory
pub fn create_test_database() -> (TempDir, Database) {
    init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(temp_dir.path().join("test.db")).expect("Failed to open database");
    (temp_dir, db)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Backend wrapper that records every statement it executes.
pub struct Recording<'a> {
    inner: &'a Database,
    pub executed: RefCell<Vec<String>>,
    pub appends: RefCell<Vec<(String, usize)>>,
}

impl<'a> Recording<'a> {
    pub fn new(inner: &'a Database) -> Self {
        Self {
            inner,
            executed: RefCell::new(Vec::new()),
            appends: RefCell::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl Backend for Recording<'_> {
    fn execute(&self, sql: &str, params: &SqlRow) -> Result<usize> {
        self.executed.borrow_mut().push(sql.to_string());
        self.inner.execute(sql, params)
    }

    fn fetch_all(&self, sql: &str, params: &SqlRow) -> Result<Vec<SqlRow>> {
        self.inner.fetch_all(sql, params)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        self.inner.table_exists(table)
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        self.inner.drop_table(table)
    }

    fn bulk_append(&self, table: &str, rows: &[SqlRow]) -> Result<usize> {
        self.appends.borrow_mut().push((table.to_string(), rows.len()));
        self.inner.bulk_append(table, rows)
    }

    fn last_generated_key(&self) -> Result<Option<i64>> {
        self.inner.last_generated_key()
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        self.inner.table_columns(table)
    }
}
