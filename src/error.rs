//! Error taxonomy shared by every layer of the engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Every failure the engine can report.
///
/// The first eight variants are the user-facing taxonomy: callers are expected
/// to match on them and show the message. [DbError::Io] and [DbError::Encoding]
/// only come out of a storage backend and mean something is wrong below the
/// engine.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("{0}")]
    ColumnNotFound(String),

    #[error("{0}")]
    InvalidDataType(String),

    #[error("{0}")]
    PrimaryKeyViolation(String),

    #[error("{0}")]
    UniqueViolation(String),

    #[error("{0}")]
    NotNullViolation(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl DbError {
    /// Returns `true` for the PRIMARY KEY, UNIQUE and NOT NULL violations.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::PrimaryKeyViolation(_) | Self::UniqueViolation(_) | Self::NotNullViolation(_)
        )
    }

    /// Returns `true` when the error belongs to the user-facing taxonomy rather
    /// than to a failing storage backend.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Encoding(_))
    }
}
