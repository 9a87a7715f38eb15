//! Collection of table schemas loaded from one declaration.

use std::str::FromStr;

use indexmap::IndexMap;

use super::{SchemaDecl, TableSchema};
use crate::error::{Result, TabulaError};

/// Ordered set of table schemas, looked up by table name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: IndexMap<String, TableSchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every table of `decl`, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Fails on the first table whose schema cannot be built.
    pub fn from_decl(decl: &SchemaDecl) -> Result<Self> {
        let tables = decl
            .tables()
            .map(|(name, table)| Ok((name.to_string(), TableSchema::from_decl(name, table)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Self { tables })
    }

    /// Adds a schema, replacing any previous schema for the same table.
    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.tables.insert(schema.name().to_string(), schema);
        self
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }

    /// Like [`Catalog::get`] but reports unknown tables as invalid input.
    pub fn require(&self, table: &str) -> Result<&TableSchema> {
        self.get(table).ok_or_else(|| {
            TabulaError::invalid_input("table").with_reason(format!("no schema for '{table}'"))
        })
    }

    /// Schemas in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromStr for Catalog {
    type Err = TabulaError;

    /// Parses a JSON schema document.
    fn from_str(s: &str) -> Result<Self> {
        let decl: SchemaDecl = serde_json::from_str(s)?;
        Self::from_decl(&decl)
    }
}
