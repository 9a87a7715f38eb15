//! CRUD operations for the Store.
//!
//! Any schema set on the parameters is replaced by the catalog's schema for
//! the table; tables missing from the catalog are handled schema-less.

use log::debug;

use super::Store;
use crate::{
    error::Result,
    journal::Operation,
    operations::{self, DeleteResult, InsertResult, Outcome, UpdateResult},
    params::{Delete, Get, Insert, Update},
    schema::TableSchema,
    value::{Row, SqlRow, Value},
};

impl Store {
    /// Fetches rows, serving repeated reads from the cache when enabled.
    pub async fn get(&self, params: Get<'_>) -> Result<Outcome<Vec<Row>>> {
        let mut params = params.without_schema();
        params.options.date_origin = self.options.date_origin;
        params.options.null_as_empty = self.options.null_as_empty;

        let cache_table = params.sql.clone().unwrap_or_else(|| params.table.clone());
        let cacheable = self.cache.is_some() && !params.dry_run;
        if cacheable {
            if let Some(rows) = self.cached(&cache_table, &params.filter, &params.order_by)? {
                debug!("cache hit for {cache_table}");
                return Ok(Outcome::Executed(rows));
            }
        }

        let filter = params.filter.clone();
        let order_by = params.order_by.clone();
        let outcome = self
            .run(move |db, catalog| match catalog.get(&params.table) {
                Some(schema) => operations::get(db, &params.with_schema(schema)),
                None => operations::get(db, &params),
            })
            .await?;

        if let (Some(cache), Outcome::Executed(rows)) = (&self.cache, &outcome) {
            if cacheable {
                cache.put(&cache_table, &filter, &order_by, rows.clone())?;
            }
        }
        Ok(outcome)
    }

    /// Inserts rows and journals their keys.
    pub async fn insert(&self, params: Insert<'_>) -> Result<Outcome<InsertResult>> {
        let mut params = params.without_schema();
        params.options.date_origin = self.options.date_origin;
        params.options.null_as_empty = self.options.null_as_empty;

        let table = params.table.clone();
        let inputs: Vec<Row> = params.values.iter().cloned().collect();
        let primary_key = self
            .catalog
            .get(&table)
            .and_then(TableSchema::primary_key)
            .map(String::from);

        let outcome = self
            .run(move |db, catalog| match catalog.get(&params.table) {
                Some(schema) => operations::insert(db, &params.with_schema(schema)),
                None => operations::insert(db, &params),
            })
            .await?;

        if let Outcome::Executed(result) = &outcome {
            let keys = insert_keys(primary_key.as_deref(), &inputs, result);
            self.after_mutation(&table, Operation::Insert, keys)?;
        }
        Ok(outcome)
    }

    /// Updates rows. Rejects an empty filter unless the store allows
    /// unfiltered mutations.
    pub async fn update(&self, params: Update<'_>) -> Result<Outcome<UpdateResult>> {
        let mut params = params.without_schema();
        params.options.date_origin = self.options.date_origin;
        params.options.null_as_empty = self.options.null_as_empty;
        params.allow_unfiltered &= self.allow_unfiltered;

        let table = params.table.clone();
        let filter = params.filter.clone();
        let outcome = self
            .run(move |db, catalog| match catalog.get(&params.table) {
                Some(schema) => operations::update(db, &params.with_schema(schema)),
                None => operations::update(db, &params),
            })
            .await?;

        if !outcome.is_dry_run() {
            self.after_mutation(&table, Operation::Update, vec![filter])?;
        }
        Ok(outcome)
    }

    /// Deletes rows. Rejects an empty filter unless the store allows
    /// unfiltered mutations.
    pub async fn delete(&self, params: Delete<'_>) -> Result<Outcome<DeleteResult>> {
        let mut params = params.without_schema();
        params.options.date_origin = self.options.date_origin;
        params.options.null_as_empty = self.options.null_as_empty;
        params.allow_unfiltered &= self.allow_unfiltered;

        let table = params.table.clone();
        let filter = params.filter.clone();
        let outcome = self
            .run(move |db, catalog| match catalog.get(&params.table) {
                Some(schema) => operations::delete(db, &params.with_schema(schema)),
                None => operations::delete(db, &params),
            })
            .await?;

        if !outcome.is_dry_run() {
            self.after_mutation(&table, Operation::Delete, vec![filter])?;
        }
        Ok(outcome)
    }

    fn cached(&self, table: &str, filter: &Row, order_by: &[String]) -> Result<Option<Vec<Row>>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        if let Some(journal) = &self.journal {
            cache.sync(journal.modified()?);
        }
        cache.get(table, filter, order_by)
    }

    fn after_mutation(&self, table: &str, operation: Operation, keys: Vec<Row>) -> Result<()> {
        if let Some(cache) = &self.cache {
            // Explicit selects may read any table
            cache.clear();
        }
        if let Some(journal) = &self.journal {
            for key in keys {
                journal.record(table, operation, key)?;
            }
            debug!("journaled {} on {table}", operation.as_str());
        }
        Ok(())
    }
}

/// Journal keys for inserted rows: the primary key when the table has one
/// and it is known, otherwise the values as given.
fn insert_keys(primary_key: Option<&str>, inputs: &[Row], result: &InsertResult) -> Vec<Row> {
    let Some(pk) = primary_key else {
        return inputs.to_vec();
    };

    if let (Some(key), [_]) = (result.generated_key, inputs) {
        return vec![Row::from([(pk.to_string(), Value::Integer(key))])];
    }

    inputs
        .iter()
        .zip(&result.stored)
        .map(|(input, stored)| match stored_key(pk, stored) {
            Some(value) => Row::from([(pk.to_string(), value)]),
            None => input.clone(),
        })
        .collect()
}

fn stored_key(pk: &str, stored: &SqlRow) -> Option<Value> {
    stored
        .get(pk)
        .cloned()
        .map(Value::from)
        .filter(|value| !value.is_null())
}
