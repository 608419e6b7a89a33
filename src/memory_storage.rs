use std::{collections::BTreeMap, path::Path};

use parking_lot::RwLock;

use crate::{
    error::{DbError, Result},
    row::Row,
    storage::Storage,
    table::Schema,
};

#[derive(Debug)]
struct StoredTable {
    schema: Schema,
    rows: Option<Vec<Row>>,
}

/// In-process backend. Same contract as [crate::FileStorage], nothing
/// survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<BTreeMap<String, StoredTable>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn initialize(&mut self, _location: &Path) -> Result<()> {
        Ok(())
    }

    fn save_schema(&self, name: &str, schema: &Schema) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.get_mut(name) {
            Some(stored) => stored.schema = schema.clone(),
            None => {
                tables.insert(
                    name.to_string(),
                    StoredTable {
                        schema: schema.clone(),
                        rows: None,
                    },
                );
            }
        }
        Ok(())
    }

    fn load_schema(&self, name: &str) -> Result<Schema> {
        self.tables
            .read()
            .get(name)
            .map(|stored| stored.schema.clone())
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tables.read().contains_key(name))
    }

    fn save_rows(&self, name: &str, rows: &[Row]) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        stored.rows = Some(rows.to_vec());
        Ok(())
    }

    fn load_rows(&self, name: &str) -> Result<Vec<Row>> {
        let tables = self.tables.read();
        let stored = tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        Ok(stored.rows.clone().unwrap_or_default())
    }

    fn delete_table(&self, name: &str) -> Result<()> {
        self.tables
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        // BTreeMap keys come out sorted
        Ok(self.tables.read().keys().cloned().collect())
    }
}
