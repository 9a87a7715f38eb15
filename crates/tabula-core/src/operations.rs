//! The four CRUD operations.
//!
//! Each operation converts its input (when a schema is given), builds or
//! takes a [`Statement`], and performs exactly one call on the [`Backend`]:
//! a single execute, a fetch, or one bulk append. A dry run returns the
//! statements instead of executing them.
//!
//! # Unfiltered mutations
//!
//! An [`Update`] or [`Delete`] with an empty filter touches every row of the
//! table. This is accepted by default; set `allow_unfiltered` to `false` to
//! have such calls rejected with [`TabulaError::UnfilteredMutation`]. The
//! guard only covers generated statements: caller-supplied SQL carries its
//! own `WHERE` clause.

use log::{debug, warn};

use crate::{
    convert::{rows_to_application, to_database, to_database_raw, ConvertOptions},
    db::Backend,
    error::{Result, TabulaError},
    params::{Delete, Get, Insert, Rows, Update},
    schema::TableSchema,
    statement::Statement,
    value::{Row, SqlRow, Value},
};

/// Result of an operation: executed, or the statements a dry run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Executed(T),
    DryRun(Vec<Statement>),
}

impl<T> Outcome<T> {
    /// The executed result, or `None` for a dry run.
    pub fn executed(self) -> Option<T> {
        match self {
            Outcome::Executed(value) => Some(value),
            Outcome::DryRun(_) => None,
        }
    }

    /// Statements of a dry run; empty for executed operations.
    pub fn statements(&self) -> &[Statement] {
        match self {
            Outcome::Executed(_) => &[],
            Outcome::DryRun(statements) => statements,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Outcome::DryRun(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Executed(value) => Outcome::Executed(f(value)),
            Outcome::DryRun(statements) => Outcome::DryRun(statements),
        }
    }
}

/// Values written by an insert, plus the generated key when requested.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertResult {
    /// Database-side rows as bound, one per input row
    pub stored: Vec<SqlRow>,
    pub generated_key: Option<i64>,
}

/// Values written by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub stored: SqlRow,
    pub affected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub affected: usize,
}

/// Fetches rows matching an equality filter.
///
/// The filter is bound as-is. Fetched rows are converted to application
/// values when a schema is given; without one each column keeps its raw
/// database type. No match yields an empty vector.
pub fn get<B: Backend>(backend: &B, params: &Get<'_>) -> Result<Outcome<Vec<Row>>> {
    let filter = to_database_raw(&params.filter, &params.options)?;
    let statement = match &params.sql {
        Some(sql) => Statement::explicit(sql.as_str(), filter),
        None => Statement::select(&params.table, filter, &params.order_by),
    };

    if params.dry_run {
        return Ok(Outcome::DryRun(vec![statement]));
    }

    let fetched = backend.fetch_all(statement.sql(), statement.params())?;
    debug!("fetched {} row(s) from {}", fetched.len(), params.table);

    let rows = match params.schema {
        Some(schema) => {
            let options = params.options.with_include_missing(false);
            rows_to_application(&fetched, schema, &options)?
        }
        None => fetched
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            .collect(),
    };
    Ok(Outcome::Executed(rows))
}

/// Inserts one row, or appends a batch of rows in a single call.
///
/// With a schema, every row is completed to the full column list in
/// physical order: missing columns take their declared default or null.
/// The generated key is only fetched for single rows into tables with a
/// declared primary key.
pub fn insert<B: Backend>(backend: &B, params: &Insert<'_>) -> Result<Outcome<InsertResult>> {
    let options = params.options.with_include_missing(true);
    let stored = params
        .values
        .iter()
        .map(|row| encode_row(row, params.schema, &options))
        .collect::<Result<Vec<SqlRow>>>()?;

    let statement_for = |row: &SqlRow| match &params.sql {
        Some(sql) => Statement::explicit(sql.as_str(), row.clone()),
        None => Statement::insert(&params.table, row.clone(), params.mode),
    };

    if params.dry_run {
        return Ok(Outcome::DryRun(stored.iter().map(statement_for).collect()));
    }

    match (&params.values, &params.sql) {
        (Rows::Batch(_), None) => {
            let appended = backend.bulk_append(&params.table, &stored)?;
            debug!("appended {appended} row(s) to {}", params.table);
        }
        _ => {
            for row in &stored {
                let statement = statement_for(row);
                backend.execute(statement.sql(), statement.params())?;
            }
        }
    }

    let wants_key = params.return_key
        && matches!(params.values, Rows::Single(_))
        && params.schema.and_then(TableSchema::primary_key).is_some();
    let generated_key = if wants_key {
        backend.last_generated_key()?
    } else {
        None
    };

    Ok(Outcome::Executed(InsertResult {
        stored,
        generated_key,
    }))
}

/// Updates the columns in `values` on rows matching `filter`.
///
/// With a schema, both maps are converted without completing missing
/// columns, so only the given columns appear in `SET` and `WHERE`.
///
/// # Errors
///
/// - [`TabulaError::EmptyUpdate`] if no settable column remains
/// - [`TabulaError::InvalidInput`] if the filter names an undeclared column
/// - [`TabulaError::UnfilteredMutation`] if the statement is generated, the
///   filter is empty and `allow_unfiltered` is off
pub fn update<B: Backend>(backend: &B, params: &Update<'_>) -> Result<Outcome<UpdateResult>> {
    let options = params.options.with_include_missing(false);
    let values = encode_row(&params.values, params.schema, &options)?;
    let filter = encode_filter(&params.filter, params.schema, &options)?;

    if params.sql.is_none() {
        check_filter(&params.table, "update", &filter, params.allow_unfiltered)?;
    }

    let statement = match &params.sql {
        Some(sql) => {
            if values.is_empty() {
                return Err(TabulaError::EmptyUpdate {
                    table: params.table.clone(),
                });
            }
            let mut bound = values.clone();
            bound.extend(filter);
            Statement::explicit(sql.as_str(), bound)
        }
        None => Statement::update(&params.table, values.clone(), filter)?,
    };

    if params.dry_run {
        return Ok(Outcome::DryRun(vec![statement]));
    }

    let affected = backend.execute(statement.sql(), statement.params())?;
    debug!("updated {affected} row(s) in {}", params.table);
    Ok(Outcome::Executed(UpdateResult {
        stored: values,
        affected,
    }))
}

/// Deletes rows matching `filter`, converted through the schema when one
/// is given.
///
/// # Errors
///
/// - [`TabulaError::InvalidInput`] if the filter names an undeclared column
/// - [`TabulaError::UnfilteredMutation`] if the statement is generated, the
///   filter is empty and `allow_unfiltered` is off
pub fn delete<B: Backend>(backend: &B, params: &Delete<'_>) -> Result<Outcome<DeleteResult>> {
    let options = params.options.with_include_missing(false);
    let filter = encode_filter(&params.filter, params.schema, &options)?;
    if params.sql.is_none() {
        check_filter(&params.table, "delete", &filter, params.allow_unfiltered)?;
    }

    let statement = match &params.sql {
        Some(sql) => Statement::explicit(sql.as_str(), filter),
        None => Statement::delete(&params.table, filter),
    };

    if params.dry_run {
        return Ok(Outcome::DryRun(vec![statement]));
    }

    let affected = backend.execute(statement.sql(), statement.params())?;
    debug!("deleted {affected} row(s) from {}", params.table);
    Ok(Outcome::Executed(DeleteResult { affected }))
}

fn encode_row(row: &Row, schema: Option<&TableSchema>, options: &ConvertOptions) -> Result<SqlRow> {
    match schema {
        Some(schema) => to_database(row, schema, options),
        None => to_database_raw(row, options),
    }
}

/// Like [`encode_row`], but an undeclared column is an error: dropping it
/// would widen the statement to more rows.
fn encode_filter(filter: &Row, schema: Option<&TableSchema>, options: &ConvertOptions) -> Result<SqlRow> {
    if let Some(schema) = schema {
        if let Some(unknown) = filter.keys().find(|k| !schema.has_column(k)) {
            return Err(TabulaError::invalid_input("filter").with_reason(format!(
                "column '{unknown}' is not declared in '{}'",
                schema.name()
            )));
        }
    }
    encode_row(filter, schema, options)
}

fn check_filter(table: &str, operation: &str, filter: &SqlRow, allowed: bool) -> Result<()> {
    if !filter.is_empty() {
        return Ok(());
    }
    if !allowed {
        return Err(TabulaError::UnfilteredMutation {
            table: table.to_string(),
            operation: operation.to_string(),
        });
    }
    warn!("unfiltered {operation} on {table} touches every row");
    Ok(())
}
