//! Error types for the tabula library.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SemanticType;

/// Comprehensive error type for schema, conversion and storage operations.
#[derive(Error, Debug)]
pub enum TabulaError {
    /// A declared column type has no semantic mapping
    #[error("Unknown column type '{declared}' for column '{column}'")]
    UnknownType { column: String, declared: String },
    /// A value cannot be cast to or from its column's semantic type
    #[error("Cannot convert {value} in column '{column}' to {target}")]
    Conversion {
        column: String,
        value: String,
        target: SemanticType,
    },
    /// Update called without any column to set
    #[error("Update on '{table}' has no columns to set")]
    EmptyUpdate { table: String },
    /// Update or delete without a filter while the guard is active
    #[error("Refusing unfiltered {operation} on '{table}'")]
    UnfilteredMutation { table: String, operation: String },
    /// A post-creation index or migration statement failed
    #[error("Schema migration failed on `{statement}`: {message}")]
    SchemaMigration { statement: String, message: String },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> TabulaError {
        TabulaError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> TabulaError {
        TabulaError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl TabulaError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a conversion error for `column`, rendering the offending value.
    pub fn conversion(
        column: impl Into<String>,
        value: impl std::fmt::Debug,
        target: SemanticType,
    ) -> Self {
        Self::Conversion {
            column: column.into(),
            value: format!("{value:?}"),
            target,
        }
    }

    /// Returns the underlying backend error, if this error wraps one.
    pub fn backend_error(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Database { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;

    /// Map database errors with a lazily built message.
    fn db_context_lazy<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| TabulaError::database(message).with_source(e))
    }

    fn db_context_lazy<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| TabulaError::database(f()).with_source(e))
    }
}

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, TabulaError>;
