//! Schema model for a single table.
//!
//! A [`TableSchema`] is built once from a declaration and never mutated. It
//! carries the declared column types in physical order, the semantic type of
//! every column, the primary key, index specifications, raw migration
//! statements and per-column defaults.
//!
//! ```rust
//! use tabula_core::{SemanticType, TableSchema};
//!
//! let schema = TableSchema::from_columns(
//!     "user",
//!     [("id", "INTEGER PRIMARY KEY"), ("email", "VARCHAR(100)")],
//! )
//! .unwrap();
//!
//! assert_eq!(schema.primary_key(), Some("id"));
//! assert_eq!(schema.semantic_type("email"), Some(SemanticType::Text));
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TabulaError},
    types::{classify, SemanticType},
    value::{Row, Value},
};

pub mod catalog;
pub mod decl;


pub use catalog::Catalog;
pub use decl::{SchemaDecl, TableDecl};

const PRIMARY_KEY_MARKER: &str = "integer primary key";

/// One entry of a table's index list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexSpec {
    /// Index over one column
    Single(String),
    /// Multi-column index, columns in the given order
    Composite(Vec<String>),
}

impl IndexSpec {
    /// Columns covered by the index, in order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            IndexSpec::Single(column) => vec![column.as_str()],
            IndexSpec::Composite(columns) => columns.iter().map(String::as_str).collect(),
        }
    }

    /// Deterministic index name: `idx_<table>_<col1>_<col2>...`.
    pub fn index_name(&self, table: &str) -> String {
        format!("idx_{}_{}", table, self.columns().join("_"))
    }

    /// `CREATE INDEX` statement for this index on `table`.
    pub fn create_sql(&self, table: &str) -> String {
        format!(
            "CREATE INDEX {} ON {}({})",
            self.index_name(table),
            table,
            self.columns().join(", ")
        )
    }
}

impl From<&str> for IndexSpec {
    fn from(column: &str) -> Self {
        IndexSpec::Single(column.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for IndexSpec {
    fn from(columns: [&str; N]) -> Self {
        IndexSpec::Composite(columns.iter().map(|c| (*c).to_string()).collect())
    }
}

/// Immutable schema of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: IndexMap<String, String>,
    semantic_types: IndexMap<String, SemanticType>,
    primary_key: Option<String>,
    indexes: Vec<IndexSpec>,
    migrations: Vec<String>,
    defaults: Row,
}

impl TableSchema {
    /// Builds a table schema, deriving semantic types and the primary key.
    ///
    /// Column order is preserved verbatim. Defaults are cast to their
    /// column's semantic type here, so a bad default fails at load time
    /// rather than on first insert.
    ///
    /// # Errors
    ///
    /// - [`TabulaError::UnknownType`] if a declared type is not recognized
    /// - [`TabulaError::InvalidInput`] if a default or index names an
    ///   undeclared column
    /// - [`TabulaError::Conversion`] if a default cannot be cast to its
    ///   column's type
    pub fn build(
        name: impl Into<String>,
        columns: IndexMap<String, String>,
        indexes: Vec<IndexSpec>,
        migrations: Vec<String>,
        defaults: Row,
    ) -> Result<Self> {
        let name = name.into();

        let semantic_types = columns
            .iter()
            .map(|(column, declared)| {
                classify(declared)
                    .map(|ty| (column.clone(), ty))
                    .map_err(|_| TabulaError::UnknownType {
                        column: column.clone(),
                        declared: declared.clone(),
                    })
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        let primary_key = columns
            .iter()
            .find(|(_, declared)| declared.to_lowercase().contains(PRIMARY_KEY_MARKER))
            .map(|(column, _)| column.clone());

        for spec in &indexes {
            if let Some(missing) = spec.columns().into_iter().find(|c| !columns.contains_key(*c)) {
                return Err(TabulaError::invalid_input(format!("{name}.index"))
                    .with_reason(format!("column '{missing}' is not declared")));
            }
        }

        let defaults = defaults
            .into_iter()
            .map(|(column, value)| {
                let Some(ty) = semantic_types.get(&column).copied() else {
                    return Err(TabulaError::invalid_input(format!("{name}.defaults"))
                        .with_reason(format!("column '{column}' is not declared")));
                };
                let typed = value
                    .coerce(ty)
                    .ok_or_else(|| TabulaError::conversion(&column, &value, ty))?;
                Ok((column, typed))
            })
            .collect::<Result<Row>>()?;

        Ok(Self {
            name,
            columns,
            semantic_types,
            primary_key,
            indexes,
            migrations,
            defaults,
        })
    }

    /// Shorthand for a schema with columns only.
    pub fn from_columns<I, K, V>(name: impl Into<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::build(name, columns, Vec::new(), Vec::new(), Row::new())
    }

    /// Builds the schema for table `name` from its declaration.
    pub fn from_decl(name: &str, decl: &TableDecl) -> Result<Self> {
        let defaults = decl
            .defaults
            .iter()
            .map(|(column, json)| Ok((column.clone(), Value::from_json(column, json)?)))
            .collect::<Result<Row>>()?;

        Self::build(
            name,
            decl.table.clone(),
            decl.index.clone(),
            decl.sql.clone(),
            defaults,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column name to declared type, in physical order.
    pub fn columns(&self) -> &IndexMap<String, String> {
        &self.columns
    }

    /// Column name to semantic type, in physical order.
    pub fn semantic_types(&self) -> &IndexMap<String, SemanticType> {
        &self.semantic_types
    }

    pub fn column_type(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    pub fn semantic_type(&self, column: &str) -> Option<SemanticType> {
        self.semantic_types.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// First column declared as `INTEGER PRIMARY KEY`, if any.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// Raw statements run right after the table is created.
    pub fn migrations(&self) -> &[String] {
        &self.migrations
    }

    pub fn defaults(&self) -> &Row {
        &self.defaults
    }

    /// The declared default for `column`, if any.
    pub fn default_for(&self, column: &str) -> Option<&Value> {
        self.defaults.get(column)
    }

    /// A template row: every column set to its type's empty value, then
    /// overlaid with the declared defaults.
    pub fn empty_row(&self) -> Row {
        self.semantic_types
            .iter()
            .map(|(column, ty)| {
                let value = self
                    .defaults
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| ty.empty_value());
                (column.clone(), value)
            })
            .collect()
    }

    /// `CREATE TABLE` statement with columns in declared order.
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|(column, declared)| format!("{column} {declared}"))
            .collect();
        format!("CREATE TABLE {}({})", self.name, columns.join(", "))
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {}", self.name)?;
        writeln!(f)?;
        for (column, declared) in &self.columns {
            let ty = self.semantic_types[column];
            write!(f, "- **{column}**: {declared} ({ty})")?;
            if self.primary_key.as_deref() == Some(column.as_str()) {
                write!(f, " [primary key]")?;
            }
            if let Some(default) = self.defaults.get(column) {
                write!(f, " default {default}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
