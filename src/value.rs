use std::{cmp::Ordering, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// Represents a single data value stored in the database.
///
/// This enum wraps all supported Rust types into a single type that can be
/// passed around the engine. It includes support for SQL `NULL` values.
///
/// Values serialize to plain JSON scalars; the variant order matters for
/// deserialization, which tries each variant in turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// represents an empty or missing value.
    Null,
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A UTF-8 string value, wrapped in an [Arc] for efficient,
    /// thread-safe sharing and cheap cloning.
    Text(Arc<str>),
}

impl Value {
    /// Materializes a literal captured by the parser.
    ///
    /// The text is tried as an integer, then as a float, and kept as a string
    /// otherwise. Quoting does not matter: `'123'` and `123` both become
    /// [Value::Int]. Non-finite floats (`inf`, `nan`) stay strings.
    pub fn from_literal(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Self::Float(f);
            }
        }
        Self::Text(Arc::from(text))
    }

    /// Returns `true` if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the inner integer value if this is a [Value::Int].
    /// Otherwise, returns `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the inner float value if this is a [Value::Float].
    /// Otherwise, returns `None`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the inner string slice if this is a [Value::Text].
    /// Otherwise, returns `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner boolean value if this is a [Value::Bool].
    /// Otherwise, returns `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the runtime kind, used in validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "string",
        }
    }

    /// Strict type check against a column's declared type. NULL is never
    /// accepted here; nullability is a constraint question, not a type one.
    pub fn matches_type(&self, data_type: DataType) -> bool {
        matches!(
            (data_type, self),
            (DataType::Int, Self::Int(_))
                | (DataType::Float, Self::Int(_) | Self::Float(_))
                | (DataType::Bool, Self::Bool(_))
                | (DataType::Varchar | DataType::Date, Self::Text(_))
        )
    }

    /// Best-effort conversion of a stored value toward the kind of a WHERE
    /// literal before comparing them.
    ///
    /// An integer literal pulls the value through an integer parse (floats are
    /// truncated, booleans become 0/1); a float literal pulls it through a
    /// float parse. When the conversion fails the value is returned unchanged.
    pub fn coerce_like(&self, literal: &Value) -> Value {
        let coerced = match (literal, self) {
            (Self::Int(_), Self::Text(s)) => s.trim().parse::<i64>().ok().map(Self::Int),
            (Self::Int(_), Self::Float(f)) if f.is_finite() => Some(Self::Int(f.trunc() as i64)),
            (Self::Int(_), Self::Bool(b)) => Some(Self::Int(i64::from(*b))),
            (Self::Float(_), Self::Text(s)) => s.trim().parse::<f64>().ok().map(Self::Float),
            (Self::Float(_), Self::Int(i)) => Some(Self::Float(*i as f64)),
            (Self::Float(_), Self::Bool(b)) => Some(Self::Float(f64::from(u8::from(*b)))),
            _ => None,
        };
        coerced.unwrap_or_else(|| self.clone())
    }

    /// Orders two values when they are comparable.
    ///
    /// Integers and floats compare numerically with each other; strings and
    /// booleans only with their own kind. `NULL` is never comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Some(l.cmp(r)),
            (Self::Float(l), Self::Float(r)) => l.partial_cmp(r),
            (Self::Int(l), Self::Float(r)) => (*l as f64).partial_cmp(r),
            (Self::Float(l), Self::Int(r)) => l.partial_cmp(&(*r as f64)),
            (Self::Text(l), Self::Text(r)) => Some(l.cmp(r)),
            (Self::Bool(l), Self::Bool(r)) => Some(l.cmp(r)),
            _ => None,
        }
    }

    /// Equality as seen by constraints and joins: `1` equals `1.0`, and `NULL`
    /// equals nothing.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}
