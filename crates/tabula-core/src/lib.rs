//! Schema-driven typed CRUD over SQLite.
//!
//! Tables are declared once as a [`Catalog`]: column names mapped to SQL
//! type declarations, plus indices, migration statements and defaults.
//! Every value crossing the database boundary is converted according to
//! the column's [`SemanticType`], so callers work with booleans, calendar
//! dates and timestamps while the database stores integers and reals.
//!
//! # Layers
//!
//! - [`types`]: classifying declared SQL types
//! - [`schema`]: table schemas and the catalog they are loaded from
//! - [`convert`]: application rows to database rows and back
//! - [`statement`]: parameterized `SELECT`/`INSERT`/`UPDATE`/`DELETE`
//! - [`operations`]: synchronous CRUD against any [`Backend`]
//! - [`materialize`]: creating tables, indices and migrations
//! - [`store`]: async facade with a read cache and mutation journal
//!
//! # Quick Start
//!
//! ```rust
//! use tabula_core::{operations, params::{Get, Insert}, row, Database, TableSchema, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open_in_memory()?;
//! let schema = TableSchema::from_columns(
//!     "user",
//!     [("id", "INTEGER PRIMARY KEY"), ("email", "TEXT"), ("active", "BOOLEAN")],
//! )?;
//! tabula_core::materialize(&db, [&schema], &Default::default())?;
//!
//! operations::insert(
//!     &db,
//!     &Insert::new("user", row! { "email" => "a@b.com", "active" => true }).with_schema(&schema),
//! )?;
//!
//! let rows = operations::get(&db, &Get::new("user").with_schema(&schema))?
//!     .executed()
//!     .unwrap_or_default();
//! assert_eq!(rows[0]["active"], Value::Boolean(true));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod convert;
pub mod db;
pub mod display;
pub mod error;
pub mod journal;
pub mod materialize;
pub mod operations;
pub mod params;
pub mod schema;
pub mod statement;
pub mod store;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use cache::ReadCache;
pub use convert::{to_application, to_database, ConvertOptions};
pub use db::{Backend, Database};
pub use display::RowsTable;
pub use error::{Result, TabulaError};
pub use journal::{Journal, JournalEntry, Operation};
pub use materialize::{materialize, MaterializeOptions, MaterializeReport, TableReport};
pub use operations::{DeleteResult, InsertResult, Outcome, UpdateResult};
pub use schema::{Catalog, IndexSpec, SchemaDecl, TableDecl, TableSchema};
pub use statement::{InsertMode, Statement};
pub use store::{Store, StoreBuilder};
pub use types::{classify, SemanticType};
pub use value::{Row, SqlRow, SqlValue, Value};
