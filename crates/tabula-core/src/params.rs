//! Parameter structures for the CRUD operations.
//!
//! Each operation takes one of these structs. Fields are public so callers
//! can adjust them directly; the chained setters cover the common cases:
//!
//! ```rust
//! use tabula_core::{params::Get, row};
//!
//! let get = Get::new("user")
//!     .with_filter(row! { "country" => "NZ" })
//!     .order_by("age DESC");
//!
//! assert_eq!(get.order_by, ["age DESC"]);
//! ```
//!
//! The optional `schema` borrows a [`TableSchema`]; without one, values are
//! bound as-is and fetched rows keep their raw database types.

use crate::{
    convert::ConvertOptions,
    schema::TableSchema,
    statement::InsertMode,
    value::Row,
};

/// Input shape of an insert: one row, or a batch appended in one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    Single(Row),
    Batch(Vec<Row>),
}

impl Rows {
    pub fn len(&self) -> usize {
        match self {
            Rows::Single(_) => 1,
            Rows::Batch(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        let rows: &[Row] = match self {
            Rows::Single(row) => std::slice::from_ref(row),
            Rows::Batch(rows) => rows,
        };
        rows.iter()
    }
}

impl From<Row> for Rows {
    fn from(row: Row) -> Self {
        Rows::Single(row)
    }
}

impl From<Vec<Row>> for Rows {
    fn from(rows: Vec<Row>) -> Self {
        Rows::Batch(rows)
    }
}

/// Parameters for [`crate::operations::get`].
#[derive(Debug, Clone)]
pub struct Get<'a> {
    /// Table name, or a complete `SELECT` statement
    pub table: String,
    /// Equality filter, ANDed in key order
    pub filter: Row,
    /// Terms like `"age DESC"`
    pub order_by: Vec<String>,
    pub schema: Option<&'a TableSchema>,
    /// Replaces the generated statement; `filter` is bound to it
    pub sql: Option<String>,
    pub options: ConvertOptions,
    pub dry_run: bool,
}

impl Get<'_> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: Row::new(),
            order_by: Vec::new(),
            schema: None,
            sql: None,
            options: ConvertOptions::default(),
            dry_run: false,
        }
    }

    pub fn with_filter(mut self, filter: Row) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order_by.push(term.into());
        self
    }

    pub fn with_schema<'b>(self, schema: &'b TableSchema) -> Get<'b> {
        self.rebind(Some(schema))
    }

    /// Drops the borrowed schema, e.g. to move the parameters to another
    /// thread.
    pub fn without_schema(self) -> Get<'static> {
        self.rebind(None)
    }

    fn rebind<'b>(self, schema: Option<&'b TableSchema>) -> Get<'b> {
        Get {
            table: self.table,
            filter: self.filter,
            order_by: self.order_by,
            schema,
            sql: self.sql,
            options: self.options,
            dry_run: self.dry_run,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Parameters for [`crate::operations::insert`].
#[derive(Debug, Clone)]
pub struct Insert<'a> {
    pub table: String,
    pub values: Rows,
    pub schema: Option<&'a TableSchema>,
    pub sql: Option<String>,
    pub mode: InsertMode,
    /// Fetch the generated primary key after a single-row insert
    pub return_key: bool,
    /// Conversion options; `include_missing` is always forced on
    pub options: ConvertOptions,
    pub dry_run: bool,
}

impl Insert<'_> {
    pub fn new(table: impl Into<String>, values: impl Into<Rows>) -> Self {
        Self {
            table: table.into(),
            values: values.into(),
            schema: None,
            sql: None,
            mode: InsertMode::Insert,
            return_key: false,
            options: ConvertOptions::insert(),
            dry_run: false,
        }
    }

    pub fn with_schema<'b>(self, schema: &'b TableSchema) -> Insert<'b> {
        self.rebind(Some(schema))
    }

    pub fn without_schema(self) -> Insert<'static> {
        self.rebind(None)
    }

    fn rebind<'b>(self, schema: Option<&'b TableSchema>) -> Insert<'b> {
        Insert {
            table: self.table,
            values: self.values,
            schema,
            sql: self.sql,
            mode: self.mode,
            return_key: self.return_key,
            options: self.options,
            dry_run: self.dry_run,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn returning_key(mut self) -> Self {
        self.return_key = true;
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Parameters for [`crate::operations::update`].
#[derive(Debug, Clone)]
pub struct Update<'a> {
    pub table: String,
    /// Columns to set
    pub values: Row,
    /// Rows to touch; empty means every row
    pub filter: Row,
    pub schema: Option<&'a TableSchema>,
    pub sql: Option<String>,
    /// Accept an empty filter. Defaults to `true`.
    pub allow_unfiltered: bool,
    /// Conversion options; `include_missing` is always forced off
    pub options: ConvertOptions,
    pub dry_run: bool,
}

impl Update<'_> {
    pub fn new(table: impl Into<String>, values: Row) -> Self {
        Self {
            table: table.into(),
            values,
            filter: Row::new(),
            schema: None,
            sql: None,
            allow_unfiltered: true,
            options: ConvertOptions::default(),
            dry_run: false,
        }
    }

    pub fn with_filter(mut self, filter: Row) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_schema<'b>(self, schema: &'b TableSchema) -> Update<'b> {
        self.rebind(Some(schema))
    }

    pub fn without_schema(self) -> Update<'static> {
        self.rebind(None)
    }

    fn rebind<'b>(self, schema: Option<&'b TableSchema>) -> Update<'b> {
        Update {
            table: self.table,
            values: self.values,
            filter: self.filter,
            schema,
            sql: self.sql,
            allow_unfiltered: self.allow_unfiltered,
            options: self.options,
            dry_run: self.dry_run,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn allow_unfiltered(mut self, allow: bool) -> Self {
        self.allow_unfiltered = allow;
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Parameters for [`crate::operations::delete`].
///
/// With a schema the filter is converted like an update filter; without
/// one it is bound as-is.
#[derive(Debug, Clone)]
pub struct Delete<'a> {
    pub table: String,
    /// Rows to delete; empty means every row
    pub filter: Row,
    pub schema: Option<&'a TableSchema>,
    pub sql: Option<String>,
    /// Accept an empty filter. Defaults to `true`.
    pub allow_unfiltered: bool,
    pub options: ConvertOptions,
    pub dry_run: bool,
}

impl Delete<'_> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: Row::new(),
            schema: None,
            sql: None,
            allow_unfiltered: true,
            options: ConvertOptions::default(),
            dry_run: false,
        }
    }

    pub fn with_filter(mut self, filter: Row) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_schema<'b>(self, schema: &'b TableSchema) -> Delete<'b> {
        self.rebind(Some(schema))
    }

    pub fn without_schema(self) -> Delete<'static> {
        self.rebind(None)
    }

    fn rebind<'b>(self, schema: Option<&'b TableSchema>) -> Delete<'b> {
        Delete {
            table: self.table,
            filter: self.filter,
            schema,
            sql: self.sql,
            allow_unfiltered: self.allow_unfiltered,
            options: self.options,
            dry_run: self.dry_run,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn allow_unfiltered(mut self, allow: bool) -> Self {
        self.allow_unfiltered = allow;
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}
