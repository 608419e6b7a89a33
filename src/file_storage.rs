use std::{
    fs,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{
    error::{DbError, Result},
    row::Row,
    storage::Storage,
    table::Schema,
};

const SCHEMAS_DIR: &str = "schemas";
const TABLES_DIR: &str = "tables";

/// Reference backend: one JSON document per schema and per row sequence.
///
/// ```text
/// <root>/schemas/<table>.json   {"name": ..., "columns": [...]}
/// <root>/tables/<table>.json    [{"id": 1, ...}, ...]
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    pretty: bool,
}

impl FileStorage {
    /// Creates a backend rooted at `root`. Nothing touches the disk until
    /// [Storage::initialize] runs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pretty: true,
        }
    }

    /// Chooses between indented and compact JSON output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_path(&self, name: &str) -> PathBuf {
        self.root.join(SCHEMAS_DIR).join(format!("{name}.json"))
    }

    fn rows_path(&self, name: &str) -> PathBuf {
        self.root.join(TABLES_DIR).join(format!("{name}.json"))
    }

    fn ensure_exists(&self, name: &str) -> Result<()> {
        if self.schema_path(name).is_file() {
            Ok(())
        } else {
            Err(DbError::TableNotFound(name.to_string()))
        }
    }

    /// Writes to a sibling temp file and renames it into place, so a reader
    /// or a crash never sees a half-written document.
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            if self.pretty {
                serde_json::to_writer_pretty(&mut writer, value)?;
            } else {
                serde_json::to_writer(&mut writer, value)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let reader = BufReader::new(fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Storage for FileStorage {
    fn initialize(&mut self, location: &Path) -> Result<()> {
        self.root = location.to_path_buf();
        fs::create_dir_all(self.root.join(SCHEMAS_DIR))?;
        fs::create_dir_all(self.root.join(TABLES_DIR))?;
        info!(root = %self.root.display(), "file storage initialized");
        Ok(())
    }

    fn save_schema(&self, name: &str, schema: &Schema) -> Result<()> {
        debug!(table = name, "writing schema");
        self.write_json(&self.schema_path(name), schema)
    }

    fn load_schema(&self, name: &str) -> Result<Schema> {
        self.ensure_exists(name)?;
        Self::read_json(&self.schema_path(name))
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.schema_path(name).is_file())
    }

    fn save_rows(&self, name: &str, rows: &[Row]) -> Result<()> {
        self.ensure_exists(name)?;
        debug!(table = name, rows = rows.len(), "writing rows");
        self.write_json(&self.rows_path(name), rows)
    }

    fn load_rows(&self, name: &str) -> Result<Vec<Row>> {
        self.ensure_exists(name)?;
        let path = self.rows_path(name);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let rows: Vec<Row> = Self::read_json(&path)?;
        debug!(table = name, rows = rows.len(), "loaded rows");
        Ok(rows)
    }

    fn delete_table(&self, name: &str) -> Result<()> {
        self.ensure_exists(name)?;
        fs::remove_file(self.schema_path(name))?;
        let rows = self.rows_path(name);
        if rows.is_file() {
            fs::remove_file(rows)?;
        }
        Ok(())
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let dir = self.root.join(SCHEMAS_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
