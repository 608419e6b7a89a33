use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// Represents the supported data types in a table schema.
/// These types define the structure of columns and the expected kind of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// A 64-bit signed integer.
    #[serde(rename = "INTEGER")]
    Int,
    /// A UTF-8 string, bounded by the column's `max_length` when one is set.
    #[serde(rename = "VARCHAR")]
    Varchar,
    /// A 64-bit floating-point number. Integers are accepted as well.
    #[serde(rename = "FLOAT")]
    Float,
    /// A boolean value (true or false).
    #[serde(rename = "BOOLEAN")]
    Bool,
    /// A date, stored as a string. The format is not checked.
    #[serde(rename = "DATE")]
    Date,
}

impl DataType {
    /// The SQL spelling of the type, as it appears in `CREATE TABLE`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "INTEGER",
            Self::Varchar => "VARCHAR",
            Self::Float => "FLOAT",
            Self::Bool => "BOOLEAN",
            Self::Date => "DATE",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = DbError;

    /// Resolves a type name case-insensitively.
    ///
    /// # Errors
    /// Returns [DbError::InvalidDataType] for anything outside the five supported types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INTEGER" => Ok(Self::Int),
            "VARCHAR" => Ok(Self::Varchar),
            "FLOAT" => Ok(Self::Float),
            "BOOLEAN" => Ok(Self::Bool),
            "DATE" => Ok(Self::Date),
            _ => Err(DbError::InvalidDataType(format!("Invalid data type: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("integer".parse::<DataType>().unwrap(), DataType::Int);
        assert_eq!("VarChar".parse::<DataType>().unwrap(), DataType::Varchar);
        assert_eq!("DATE".parse::<DataType>().unwrap(), DataType::Date);
    }

    #[test]
    fn test_unknown_type() {
        let err = "TEXT".parse::<DataType>().unwrap_err();
        assert!(matches!(err, DbError::InvalidDataType(_)));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&DataType::Bool).unwrap(), "\"BOOLEAN\"");
        let t: DataType = serde_json::from_str("\"FLOAT\"").unwrap();
        assert_eq!(t, DataType::Float);
    }
}
