//! Builder for creating and configuring Store instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use jiff::civil;
use log::info;
use tokio::task;

use super::Store;
use crate::{
    cache::ReadCache,
    convert::ConvertOptions,
    db::Database,
    error::{Result, TabulaError},
    journal::Journal,
    materialize::{materialize, MaterializeOptions, MaterializeReport},
    schema::Catalog,
};

/// Builder for creating and configuring Store instances.
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    database_path: Option<PathBuf>,
    journal_path: Option<PathBuf>,
    catalog: Catalog,
    cache: bool,
    options: ConvertOptions,
    allow_unfiltered: bool,
    materialize: MaterializeOptions,
}

impl StoreBuilder {
    /// Creates a new builder with default settings.
    ///
    /// Unfiltered updates and deletes are rejected unless
    /// [`StoreBuilder::allow_unfiltered`] turns them back on.
    pub fn new() -> Self {
        Self {
            database_path: None,
            journal_path: None,
            catalog: Catalog::new(),
            cache: false,
            options: ConvertOptions::default(),
            allow_unfiltered: false,
            materialize: MaterializeOptions::default(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/tabula/tabula.db` or `~/.local/share/tabula/tabula.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Tables to materialize on build and to resolve schemas from.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Appends every successful mutation to a JSON-lines file.
    pub fn with_journal_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.journal_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Memoizes reads, invalidated by the journal.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn with_date_origin(mut self, origin: civil::Date) -> Self {
        self.options = self.options.with_date_origin(origin);
        self.materialize.date_origin = origin;
        self
    }

    /// Substitute empty values for nulls in both directions.
    pub fn with_null_as_empty(mut self, null_as_empty: bool) -> Self {
        self.options = self.options.with_null_as_empty(null_as_empty);
        self
    }

    pub fn allow_unfiltered(mut self, allow: bool) -> Self {
        self.allow_unfiltered = allow;
        self
    }

    /// Drop and recreate every catalog table on build.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.materialize.overwrite = overwrite;
        self
    }

    /// Add declared columns missing from existing tables on build.
    pub fn reconcile(mut self, reconcile: bool) -> Self {
        self.materialize.reconcile = reconcile;
        self
    }

    /// Builds the configured store and materializes its catalog.
    ///
    /// # Errors
    ///
    /// Returns `TabulaError::FileSystem` if a parent directory cannot be
    /// created, `TabulaError::Database` if opening the database or creating
    /// a table fails, and `TabulaError::SchemaMigration` if an index or
    /// migration statement fails
    pub async fn build(self) -> Result<Store> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        create_parent_dir(&db_path)?;
        if let Some(journal_path) = &self.journal_path {
            create_parent_dir(journal_path)?;
        }

        let catalog = Arc::new(self.catalog);
        let report = {
            let db_path = db_path.clone();
            let catalog = Arc::clone(&catalog);
            let options = self.materialize;
            task::spawn_blocking(move || {
                let db = Database::new(&db_path)?;
                materialize(&db, catalog.tables(), &options)
            })
            .await
            .map_err(|e| TabulaError::Configuration {
                message: format!("Task join error: {e}"),
            })??
        };
        log_report(&report);

        Ok(Store {
            db_path,
            catalog,
            journal: self.journal_path.map(Journal::new),
            cache: self.cache.then(|| Arc::new(ReadCache::new())),
            options: self.options,
            allow_unfiltered: self.allow_unfiltered,
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("tabula")
            .place_data_file("tabula.db")
            .map_err(|e| TabulaError::XdgDirectory(e.to_string()))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| TabulaError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

fn log_report(report: &MaterializeReport) {
    let created = report.created();
    if !created.is_empty() {
        info!("materialized {} table(s): {}", created.len(), created.join(", "));
    }
    for table in report.tables.iter().filter(|t| !t.added_columns.is_empty()) {
        info!(
            "reconciled {}: added {}",
            table.table,
            table.added_columns.join(", ")
        );
    }
}
