//! Declarative schema documents.
//!
//! These types mirror the schema file layout: a mapping from table name to a
//! block with `table`, `index`, `sql` and `defaults` keys. Parsing the file
//! itself is left to the caller; anything serde can read will do.
//!
//! ```rust
//! use tabula_core::SchemaDecl;
//!
//! let decl: SchemaDecl = serde_json::from_str(r#"{
//!     "user": {
//!         "table": { "userid": "VARCHAR(20)", "age": "INTEGER" },
//!         "index": ["age"]
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(decl.tables().count(), 1);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::IndexSpec;

/// Declaration of a whole schema, tables in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDecl(pub IndexMap<String, TableDecl>);

impl SchemaDecl {
    /// Iterates `(table name, declaration)` pairs in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableDecl)> {
        self.0.iter().map(|(name, decl)| (name.as_str(), decl))
    }
}

/// Declaration of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDecl {
    /// Column name to declared SQL type, in physical order
    pub table: IndexMap<String, String>,
    /// Single column names or column lists
    #[serde(default)]
    pub index: Vec<IndexSpec>,
    /// Raw statements run once after the table is created
    #[serde(default)]
    pub sql: Vec<String>,
    /// Default values for template rows and added columns
    #[serde(default)]
    pub defaults: IndexMap<String, serde_json::Value>,
}
