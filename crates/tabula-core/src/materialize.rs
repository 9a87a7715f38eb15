//! Creating tables, indices and migrations from schemas.
//!
//! Materialization is not atomic: a failing index or migration statement
//! leaves the table created without the remaining statements. The error
//! names the statement that failed so callers can repair by hand.

use jiff::civil;
use log::{info, warn};

use crate::{
    convert::{to_database, ConvertOptions},
    db::{utils::sql_literal, Backend},
    error::{Result, TabulaError},
    schema::TableSchema,
    value::SqlRow,
};

/// Controls how existing tables are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Drop each table first and recreate it
    pub overwrite: bool,
    /// Add declared columns missing from existing tables
    pub reconcile: bool,
    /// Origin used to encode temporal defaults of added columns
    pub date_origin: civil::Date,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            reconcile: false,
            date_origin: ConvertOptions::default().date_origin,
        }
    }
}

/// What happened to one table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableReport {
    pub table: String,
    pub dropped: bool,
    pub created: bool,
    /// Columns added to an existing table
    pub added_columns: Vec<String>,
}

/// Per-table outcome of [`materialize`], in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterializeReport {
    pub tables: Vec<TableReport>,
}

impl MaterializeReport {
    /// Names of the tables created by this run.
    pub fn created(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.created)
            .map(|t| t.table.as_str())
            .collect()
    }
}

/// Creates every missing table with its indices and migration statements.
///
/// Existing tables are left alone unless `overwrite` drops them first or
/// `reconcile` adds their missing columns. Running twice without either
/// option is a no-op the second time.
///
/// # Errors
///
/// - a `CREATE TABLE` failure propagates as [`TabulaError::Database`]
/// - an index or migration failure becomes [`TabulaError::SchemaMigration`]
pub fn materialize<'s, B, I>(
    backend: &B,
    schemas: I,
    options: &MaterializeOptions,
) -> Result<MaterializeReport>
where
    B: Backend,
    I: IntoIterator<Item = &'s TableSchema>,
{
    let mut report = MaterializeReport::default();

    for schema in schemas {
        let name = schema.name();
        let mut table = TableReport {
            table: name.to_string(),
            ..TableReport::default()
        };

        if options.overwrite {
            match backend.drop_table(name) {
                Ok(()) => {
                    info!("dropped table {name}");
                    table.dropped = true;
                }
                Err(e) => warn!("ignoring failure to drop {name}: {e}"),
            }
        }

        if backend.table_exists(name)? {
            if options.reconcile {
                table.added_columns = reconcile(backend, schema, options)?;
            }
        } else {
            create(backend, schema)?;
            table.created = true;
        }

        report.tables.push(table);
    }

    Ok(report)
}

fn create<B: Backend>(backend: &B, schema: &TableSchema) -> Result<()> {
    let name = schema.name();
    backend.execute(&schema.create_table_sql(), &SqlRow::new())?;
    info!("created table {name}");

    let indexes = schema.indexes().iter().map(|spec| spec.create_sql(name));
    let migrations = schema.migrations().iter().cloned();
    for statement in indexes.chain(migrations) {
        backend
            .execute(&statement, &SqlRow::new())
            .map_err(|e| TabulaError::SchemaMigration {
                message: e.backend_error().map_or_else(|| e.to_string(), ToString::to_string),
                statement,
            })?;
    }
    Ok(())
}

/// Adds declared columns absent from the live table, in declared order.
fn reconcile<B: Backend>(
    backend: &B,
    schema: &TableSchema,
    options: &MaterializeOptions,
) -> Result<Vec<String>> {
    let name = schema.name();
    let live = backend.table_columns(name)?;

    // Defaults go through the same conversion as inserted values
    let convert = ConvertOptions::default().with_date_origin(options.date_origin);
    let defaults = to_database(schema.defaults(), schema, &convert)?;

    let mut added = Vec::new();
    for (column, declared) in schema.columns() {
        if live.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            continue;
        }

        let mut statement = format!("ALTER TABLE {name} ADD COLUMN {column} {declared}");
        if let Some(default) = defaults.get(column) {
            statement.push_str(" DEFAULT ");
            statement.push_str(&sql_literal(default));
        }
        backend
            .execute(&statement, &SqlRow::new())
            .map_err(|e| TabulaError::SchemaMigration {
                message: e.backend_error().map_or_else(|| e.to_string(), ToString::to_string),
                statement,
            })?;

        info!("added column {column} to {name}");
        added.push(column.clone());
    }
    Ok(added)
}
