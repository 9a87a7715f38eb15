//! Async store facade over a database file and a schema catalog.
//!
//! [`Store`] ties the pieces together: it resolves each table's schema from
//! its [`Catalog`], runs the synchronous CRUD operations on a blocking
//! thread, serves repeated reads from the [`ReadCache`] and appends every
//! successful mutation to the [`Journal`].
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │      Store      │    │   operations    │    │    Database     │
//! │ (catalog, cache,│───▶│ (convert, build │───▶│   (Backend)     │
//! │  journal)       │    │  statements)    │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! Each call opens its own connection inside `spawn_blocking`, so a store
//! can be shared freely between tasks.
//!
//! ```rust
//! use tabula_core::{params::{Get, Insert}, row, Catalog, StoreBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog: Catalog = r#"{
//!     "user": { "table": { "id": "INTEGER PRIMARY KEY", "email": "TEXT" } }
//! }"#.parse()?;
//!
//! let store = StoreBuilder::new()
//!     .with_database_path(Some("app.db"))
//!     .with_catalog(catalog)
//!     .build()
//!     .await?;
//!
//! store.insert(Insert::new("user", row! { "email" => "a@b.com" })).await?;
//! let users = store.get(Get::new("user")).await?;
//! # Ok(())
//! # }
//! ```

use std::{path::PathBuf, sync::Arc};

use tokio::task;

use crate::{
    cache::ReadCache,
    convert::ConvertOptions,
    db::Database,
    error::{Result, TabulaError},
    journal::Journal,
    schema::Catalog,
};

pub mod builder;
pub mod crud;

#[cfg(test)]
mod tests;

pub use builder::StoreBuilder;

/// Schema-aware, journaled access to one database file.
pub struct Store {
    pub(crate) db_path: PathBuf,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) journal: Option<Journal>,
    pub(crate) cache: Option<Arc<ReadCache>>,
    pub(crate) options: ConvertOptions,
    pub(crate) allow_unfiltered: bool,
}

impl Store {
    pub fn database_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_ref()
    }

    /// A template row for `table`: empty values overlaid with defaults.
    pub fn template(&self, table: &str) -> Result<crate::value::Row> {
        Ok(self.catalog.require(table)?.empty_row())
    }

    /// Runs `f` against a fresh connection on a blocking thread.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &Catalog) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        let catalog = Arc::clone(&self.catalog);

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            f(&db, &catalog)
        })
        .await
        .map_err(|e| TabulaError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}
