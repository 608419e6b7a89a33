use serde::{Deserialize, Serialize};

use crate::{column::Column, row::Row};

/// The persisted definition of a table: its name and ordered columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub columns: Vec<Column>,
}

/// A table loaded in memory: schema plus the full row sequence.
///
/// Tables are rebuilt from storage at the start of every statement and never
/// cached between statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Assembles a table from what the storage layer returned.
    pub fn from_parts(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            name: schema.name,
            columns: schema.columns,
            rows,
        }
    }

    pub fn schema(&self) -> Schema {
        Schema {
            name: self.name.clone(),
            columns: self.columns.clone(),
        }
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn primary_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|col| col.is_primary_key())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|col| col.name.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
