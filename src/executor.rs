use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    ast::{ColumnsSelect, ComparisonOp, JoinClause, Select, SelectSource, Statement, WhereClause},
    config::Config,
    data_service::{DataService, RowPredicate},
    error::{DbError, Result},
    file_storage::FileStorage,
    parser::parse,
    row::Row,
    schema_service::SchemaService,
    storage::Storage,
    table::Schema,
    value::Value,
};

/// Outcome of a successful statement.
///
/// Serializes to `{success, message, affected_rows}` for DDL and row changes,
/// and to `{success, message, rows, row_count}` for `SELECT`. Failures are
/// never encoded here; they come back as [DbError].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Modified {
        success: bool,
        message: String,
        affected_rows: usize,
    },
    Rows {
        success: bool,
        message: String,
        rows: Vec<Row>,
        row_count: usize,
    },
}

impl QueryResult {
    fn modified(message: String, affected_rows: usize) -> Self {
        Self::Modified {
            success: true,
            message,
            affected_rows,
        }
    }

    fn selected(rows: Vec<Row>) -> Self {
        Self::Rows {
            success: true,
            message: format!("{} row(s) returned", rows.len()),
            row_count: rows.len(),
            rows,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Modified { message, .. } | Self::Rows { message, .. } => message,
        }
    }

    pub fn affected_rows(&self) -> Option<usize> {
        match self {
            Self::Modified { affected_rows, .. } => Some(*affected_rows),
            Self::Rows { .. } => None,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows { rows, .. } => Some(rows),
            Self::Modified { .. } => None,
        }
    }
}

/// A `WHERE column op literal` filter ready to run against rows.
///
/// The row value is coerced toward the literal's kind before comparing, so
/// `'42'` stored as text matches `= 42`. A missing or NULL row value never
/// matches, whatever the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: String,
    op: ComparisonOp,
    literal: Value,
}

impl Predicate {
    pub fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.column).filter(|v| !v.is_null()) else {
            return false;
        };
        let value = value.coerce_like(&self.literal);
        self.op.holds(value.compare(&self.literal))
    }
}

impl From<WhereClause> for Predicate {
    fn from(clause: WhereClause) -> Self {
        Self {
            column: clause.column,
            op: clause.op,
            literal: clause.value,
        }
    }
}

/// Entry point of the engine: parses SQL text and drives the schema and data
/// services.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use minidb::{MemoryStorage, QueryExecutor, Value};
///
/// let executor = QueryExecutor::new(Arc::new(MemoryStorage::new()));
/// executor.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(20))").unwrap();
/// executor.execute("INSERT INTO users (id, name) VALUES (1, 'Alice')").unwrap();
///
/// let result = executor.execute("SELECT name FROM users WHERE id = '1'").unwrap();
/// assert_eq!(result.rows().unwrap()[0].value("name"), Value::from("Alice"));
/// ```
#[derive(Clone)]
pub struct QueryExecutor {
    schemas: SchemaService,
    data: DataService,
}

impl QueryExecutor {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let schemas = SchemaService::new(Arc::clone(&storage));
        let data = DataService::new(storage, schemas.clone());
        Self { schemas, data }
    }

    /// Opens a file-backed engine rooted at `config.data_dir`, creating the
    /// directory layout when needed.
    pub fn open(config: &Config) -> Result<Self> {
        let mut storage = FileStorage::new(&config.data_dir).with_pretty(config.pretty);
        storage.initialize(&config.data_dir)?;
        Ok(Self::new(Arc::new(storage)))
    }

    /// Parses and runs a single statement.
    ///
    /// # Errors
    /// Any [DbError]. A failing statement leaves storage as it was.
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let statement = parse(sql)?;
        debug!(?statement, "executing");

        let result = self.run(statement);
        if let Err(err) = &result {
            if err.is_constraint_violation() {
                warn!(error = %err, "statement aborted");
            }
        }
        result
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.schemas.list_tables()
    }

    /// Schema of `table_name`.
    pub fn describe(&self, table_name: &str) -> Result<Schema> {
        Ok(self.schemas.get_table(table_name)?.schema())
    }

    fn run(&self, statement: Statement) -> Result<QueryResult> {
        match statement {
            Statement::CreateTable(create) => {
                self.schemas.create_table(&create.table_name, &create.columns)?;
                Ok(QueryResult::modified(
                    format!("Table '{}' created successfully", create.table_name),
                    0,
                ))
            }
            Statement::DropTable(drop) => {
                self.schemas.drop_table(&drop.table_name)?;
                Ok(QueryResult::modified(
                    format!("Table '{}' dropped successfully", drop.table_name),
                    0,
                ))
            }
            Statement::Insert(insert) => {
                let row: Row = insert.columns.into_iter().zip(insert.values).collect();
                self.data.insert_row(&insert.table_name, row)?;
                Ok(QueryResult::modified(
                    format!("1 row inserted into '{}'", insert.table_name),
                    1,
                ))
            }
            Statement::Select(select) => self.select(select),
            Statement::Update(update) => {
                let mut changes = Row::new();
                changes.insert(update.set.column, update.set.value);
                let count = with_filter(update.where_clause, |filter| {
                    self.data.update_rows(&update.table_name, &changes, filter)
                })?;
                Ok(QueryResult::modified(
                    format!("{count} row(s) updated in '{}'", update.table_name),
                    count,
                ))
            }
            Statement::Delete(delete) => {
                let count = with_filter(delete.where_clause, |filter| {
                    self.data.delete_rows(&delete.table_name, filter)
                })?;
                Ok(QueryResult::modified(
                    format!("{count} row(s) deleted from '{}'", delete.table_name),
                    count,
                ))
            }
        }
    }

    fn select(&self, select: Select) -> Result<QueryResult> {
        let columns = select.columns.names();
        let rows = match select.source {
            SelectSource::Table {
                table_name,
                where_clause,
            } => with_filter(where_clause, |filter| {
                self.data.select_rows(&table_name, &columns, filter)
            })?,
            SelectSource::Join(join) => {
                let (left_column, right_column) = resolve_join_columns(&join)?;
                let projection = match select.columns {
                    ColumnsSelect::Star => None,
                    ColumnsSelect::ColumnsNames(_) => Some(columns.as_slice()),
                };
                self.data.join_tables(
                    &join.left_table,
                    &join.right_table,
                    left_column,
                    right_column,
                    projection,
                )?
            }
        };
        Ok(QueryResult::selected(rows))
    }
}

/// Runs `f` with the row filter built from `where_clause`, or with none.
fn with_filter<T>(
    where_clause: Option<WhereClause>,
    f: impl FnOnce(Option<&RowPredicate<'_>>) -> Result<T>,
) -> Result<T> {
    match where_clause.map(Predicate::from) {
        Some(predicate) => {
            let filter: &RowPredicate<'_> = &|row: &Row| predicate.matches(row);
            f(Some(filter))
        }
        None => f(None),
    }
}

/// Maps the `ON` qualifiers onto the FROM and JOIN tables, in either order.
/// Returns `(left table column, right table column)`.
fn resolve_join_columns(join: &JoinClause) -> Result<(&str, &str)> {
    if join.left_ref == join.left_table && join.right_ref == join.right_table {
        return Ok((&join.left_column, &join.right_column));
    }
    if join.left_ref == join.right_table && join.right_ref == join.left_table {
        return Ok((&join.right_column, &join.left_column));
    }

    let stray = if join.left_ref != join.left_table && join.left_ref != join.right_table {
        format!("{}.{}", join.left_ref, join.left_column)
    } else {
        format!("{}.{}", join.right_ref, join.right_column)
    };
    Err(DbError::ColumnNotFound(format!(
        "Column '{stray}' does not refer to table '{}' or '{}'",
        join.left_table, join.right_table
    )))
}
