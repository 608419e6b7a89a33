//! The persistence contract the schema and data services are written against.
//!
//! A backend stores two things per table: its [Schema] and its full row
//! sequence. Services never write partial state: a statement loads what it
//! needs, works in memory, and hands complete row sequences back. That
//! load / modify / save-once ordering is what makes each statement atomic.
//!
//! There is no locking or versioning. Two callers running a load-modify-save
//! cycle on the same table at the same time both start from the same rows,
//! and whichever saves last silently wins (lost update). Embedders that share
//! one storage between threads must serialize statements per table themselves.

use std::path::Path;

use crate::{error::Result, row::Row, table::Schema};

pub trait Storage: Send + Sync {
    /// Prepares the backend to hold tables at `location`.
    fn initialize(&mut self, location: &Path) -> Result<()>;

    /// Writes or replaces the schema of `name`.
    fn save_schema(&self, name: &str, schema: &Schema) -> Result<()>;

    /// # Errors
    /// [crate::DbError::TableNotFound] if no schema was saved under `name`.
    fn load_schema(&self, name: &str) -> Result<Schema>;

    fn table_exists(&self, name: &str) -> Result<bool>;

    /// Replaces the complete row sequence of `name`.
    ///
    /// # Errors
    /// [crate::DbError::TableNotFound] if the table has no schema.
    fn save_rows(&self, name: &str, rows: &[Row]) -> Result<()>;

    /// Loads the complete row sequence of `name`; a table whose rows were
    /// never written has none.
    ///
    /// # Errors
    /// [crate::DbError::TableNotFound] if the table has no schema.
    fn load_rows(&self, name: &str) -> Result<Vec<Row>>;

    /// Removes both the schema and the rows of `name`.
    ///
    /// # Errors
    /// [crate::DbError::TableNotFound] if the table has no schema.
    fn delete_table(&self, name: &str) -> Result<()>;

    /// Names of all tables, sorted.
    fn list_tables(&self) -> Result<Vec<String>>;
}
