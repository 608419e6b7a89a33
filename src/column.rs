use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// A column-level constraint declared in `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    #[serde(rename = "PRIMARY KEY")]
    PrimaryKey,
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "NOT NULL")]
    NotNull,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PrimaryKey => "PRIMARY KEY",
            Self::Unique => "UNIQUE",
            Self::NotNull => "NOT NULL",
        })
    }
}

/// Represents a column within a table schema.
///
/// This is pure metadata: rows live in the table, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// The name of the column.
    pub name: String,
    /// The logical data type of the column.
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Upper bound on the character count of a `VARCHAR` value.
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Declared constraints, in declaration order.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Column {
    /// Creates an unconstrained column with the specified name and data type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            max_length: None,
            constraints: Vec::new(),
        }
    }

    /// Sets the `VARCHAR` length bound.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Adds a constraint, ignoring duplicates.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        if !self.has(constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn has(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }

    pub fn is_primary_key(&self) -> bool {
        self.has(Constraint::PrimaryKey)
    }

    pub fn is_unique(&self) -> bool {
        self.has(Constraint::Unique)
    }
}
