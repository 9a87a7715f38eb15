//! [`Backend`] implementation for the SQLite [`Database`].

use log::debug;
use rusqlite::params;

use super::{
    utils::{bind_named, read_row},
    Backend, Database,
};
use crate::{
    error::{DatabaseResultExt, Result},
    value::{SqlRow, SqlValue},
};

const TABLE_EXISTS_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)";
const TABLE_COLUMNS_SQL: &str = "SELECT name FROM pragma_table_info(?1) ORDER BY cid";

impl Backend for Database {
    fn execute(&self, sql: &str, params: &SqlRow) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .db_context_lazy(|| format!("Failed to prepare `{sql}`"))?;
        bind_named(&mut stmt, params)?;
        stmt.raw_execute()
            .db_context_lazy(|| format!("Failed to execute `{sql}`"))
    }

    fn fetch_all(&self, sql: &str, params: &SqlRow) -> Result<Vec<SqlRow>> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .db_context_lazy(|| format!("Failed to prepare `{sql}`"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        bind_named(&mut stmt, params)?;

        let mut rows = stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next().db_context("Failed to fetch row")? {
            out.push(read_row(row, &columns).db_context("Failed to read row")?);
        }
        Ok(out)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        self.connection
            .query_row(TABLE_EXISTS_SQL, params![table], |row| row.get(0))
            .db_context("Failed to check table existence")
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        self.connection
            .execute(&format!("DROP TABLE {table}"), [])
            .db_context_lazy(|| format!("Failed to drop table {table}"))?;
        Ok(())
    }

    fn bulk_append(&self, table: &str, rows: &[SqlRow]) -> Result<usize> {
        let Some(first) = rows.first() else {
            return Ok(0);
        };

        let columns: Vec<&str> = first.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!("bulk append of {} row(s): {sql}", rows.len());

        let tx = self
            .connection
            .unchecked_transaction()
            .db_context("Failed to begin transaction")?;
        let mut appended = 0;
        {
            let mut stmt = tx
                .prepare(&sql)
                .db_context_lazy(|| format!("Failed to prepare `{sql}`"))?;
            for row in rows {
                let values: Vec<&SqlValue> = columns
                    .iter()
                    .map(|c| row.get(*c).unwrap_or(&SqlValue::Null))
                    .collect();
                appended += stmt
                    .execute(rusqlite::params_from_iter(values))
                    .db_context_lazy(|| format!("Failed to append row to {table}"))?;
            }
        }
        tx.commit().db_context("Failed to commit transaction")?;
        Ok(appended)
    }

    fn last_generated_key(&self) -> Result<Option<i64>> {
        // Rowid 0 is a valid key; a statement that wrote nothing is not
        if self.connection.changes() == 0 {
            return Ok(None);
        }
        Ok(Some(self.connection.last_insert_rowid()))
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare(TABLE_COLUMNS_SQL)
            .db_context("Failed to prepare table info query")?;
        let columns = stmt
            .query_map(params![table], |row| row.get(0))
            .db_context_lazy(|| format!("Failed to read columns of {table}"))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .db_context_lazy(|| format!("Failed to read columns of {table}"))?;
        Ok(columns)
    }
}
