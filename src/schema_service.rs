use std::sync::Arc;

use tracing::info;

use crate::{
    ast::ColumnDef,
    column::{Column, Constraint},
    data_type::DataType,
    error::{DbError, Result},
    row::Row,
    storage::Storage,
    table::{Schema, Table},
    value::Value,
};

/// Owns table definitions: creation, lookup, removal, and checking that a row
/// fits its table's schema.
#[derive(Clone)]
pub struct SchemaService {
    storage: Arc<dyn Storage>,
}

impl SchemaService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Defines a new table and persists its schema with an empty row set.
    ///
    /// # Errors
    /// - [DbError::TableAlreadyExists] if `name` is taken.
    /// - [DbError::InvalidDataType] for an unknown type name, a second
    ///   PRIMARY KEY column, or a repeated column name.
    pub fn create_table(&self, name: &str, column_defs: &[ColumnDef]) -> Result<Table> {
        if self.storage.table_exists(name)? {
            return Err(DbError::TableAlreadyExists(name.to_string()));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(column_defs.len());
        for def in column_defs {
            let data_type: DataType = def.type_name.parse()?;

            if columns.iter().any(|c| c.name == def.name) {
                return Err(DbError::InvalidDataType(format!(
                    "Duplicate column '{}' in table '{name}'",
                    def.name
                )));
            }
            if def.constraints.contains(&Constraint::PrimaryKey)
                && columns.iter().any(Column::is_primary_key)
            {
                return Err(DbError::InvalidDataType(
                    "Table can only have one PRIMARY KEY".to_string(),
                ));
            }

            let mut column = Column::new(def.name.clone(), data_type);
            if let (DataType::Varchar, Some(max_length)) = (data_type, def.max_length) {
                column = column.with_max_length(max_length);
            }
            for constraint in &def.constraints {
                column = column.with_constraint(*constraint);
            }
            columns.push(column);
        }

        let table = Table::new(name, columns);
        self.storage.save_schema(name, &table.schema())?;
        self.storage.save_rows(name, &[])?;
        info!(table = name, columns = table.columns.len(), "table created");

        Ok(table)
    }

    /// Loads a table's schema and rows. Nothing is cached: every call reads
    /// the storage again.
    pub fn get_table(&self, name: &str) -> Result<Table> {
        if !self.storage.table_exists(name)? {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        let schema: Schema = self.storage.load_schema(name)?;
        let rows = self.storage.load_rows(name)?;
        Ok(Table::from_parts(schema, rows))
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.storage.delete_table(name)?;
        info!(table = name, "table dropped");
        Ok(())
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.storage.list_tables()
    }

    /// Checks a row against the table schema: no unknown columns, NOT NULL
    /// and PRIMARY KEY columns filled, and every present value of its
    /// column's declared type. Omitted columns count as NULL.
    ///
    /// Uniqueness is not checked here; it needs the sibling rows.
    pub fn validate_row(&self, table: &Table, row: &Row) -> Result<()> {
        if let Some(unknown) = row.keys().find(|key| table.get_column(key).is_none()) {
            return Err(DbError::ColumnNotFound(format!(
                "Column '{unknown}' does not exist in table '{}'",
                table.name
            )));
        }

        for column in &table.columns {
            let value = row.get(&column.name).unwrap_or(&Value::Null);

            if value.is_null() {
                if column.has(Constraint::NotNull) {
                    return Err(DbError::NotNullViolation(format!(
                        "Column '{}' cannot be NULL",
                        column.name
                    )));
                }
                if column.is_primary_key() {
                    return Err(DbError::PrimaryKeyViolation(format!(
                        "PRIMARY KEY column '{}' cannot be NULL",
                        column.name
                    )));
                }
                continue;
            }

            validate_data_type(column, value)?;
        }

        Ok(())
    }
}

fn validate_data_type(column: &Column, value: &Value) -> Result<()> {
    if !value.matches_type(column.data_type) {
        return Err(DbError::InvalidDataType(format!(
            "Column '{}' expects {}, got {}",
            column.name,
            column.data_type,
            value.kind_name()
        )));
    }

    if let (Some(max_length), Some(text)) = (column.max_length, value.as_str()) {
        let length = text.chars().count();
        if length > max_length {
            return Err(DbError::InvalidDataType(format!(
                "Column '{}' max length is {max_length}, got {length}",
                column.name
            )));
        }
    }

    Ok(())
}
