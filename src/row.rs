use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{column::Column, value::Value};

/// A row: column names mapped to values, in a stable order.
///
/// A key that is absent reads as `NULL`. Rows are small (one entry per
/// column), so lookups are linear scans over the entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value stored under `key`, or `None` if the row omits it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the value under `key`, reading an omitted key as `NULL`.
    pub fn value(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets `key` to `value`, keeping the key's position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this row with every entry of `updates` written over it.
    pub fn overlaid(&self, updates: &Row) -> Row {
        let mut row = self.clone();
        for (k, v) in updates.iter() {
            row.insert(k, v.clone());
        }
        row
    }

    /// Reorders the entries to follow the schema's column order. Keys that are
    /// not in the schema keep their relative order at the end.
    pub fn ordered_by(mut self, columns: &[Column]) -> Row {
        let rank = |key: &str| {
            columns
                .iter()
                .position(|c| c.name == key)
                .unwrap_or(columns.len())
        };
        self.entries.sort_by_key(|(k, _)| rank(k));
        self
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object mapping column names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut row = Row::new();
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            row.insert(k, v);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Row, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// Builds a [Row] from `key => value` pairs, converting each value with `Value::from`.
#[macro_export]
macro_rules! row {
    ($($key:expr => $value:expr),* $(,)?) => {
        $crate::row::Row::from_iter([$(($key, $crate::value::Value::from($value))),*])
    };
}
