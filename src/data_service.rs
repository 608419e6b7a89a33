use std::sync::Arc;

use bitvec::prelude::*;
use tracing::debug;

use crate::{
    column::Column,
    error::{DbError, Result},
    row::Row,
    schema_service::SchemaService,
    storage::Storage,
    table::Table,
    value::Value,
};

/// A row filter, typically built from a WHERE clause.
pub type RowPredicate<'a> = dyn Fn(&Row) -> bool + 'a;

/// Row-level operations. Every call reloads the table through the
/// [SchemaService], works on the in-memory copy, and writes the complete row
/// sequence back at most once, after every check has passed.
#[derive(Clone)]
pub struct DataService {
    storage: Arc<dyn Storage>,
    schemas: SchemaService,
}

impl DataService {
    pub fn new(storage: Arc<dyn Storage>, schemas: SchemaService) -> Self {
        Self { storage, schemas }
    }

    /// Appends one row.
    ///
    /// # Errors
    /// Anything [SchemaService::validate_row] rejects, then
    /// [DbError::PrimaryKeyViolation] or [DbError::UniqueViolation] when the
    /// row collides with an existing one.
    pub fn insert_row(&self, table_name: &str, row: Row) -> Result<()> {
        let mut table = self.schemas.get_table(table_name)?;
        self.schemas.validate_row(&table, &row)?;

        if let Some(pk) = table.primary_key_column() {
            let value = row.value(&pk.name);
            if collides(&table.rows, None, &pk.name, &value) {
                return Err(primary_key_violation(&value));
            }
        }

        for column in table.columns.iter().filter(|c| c.is_unique()) {
            if collides(&table.rows, None, &column.name, &row.value(&column.name)) {
                return Err(unique_violation(column));
            }
        }

        let row = row.ordered_by(&table.columns);
        table.rows.push(row);
        self.storage.save_rows(table_name, &table.rows)
    }

    /// Returns the rows matching `predicate` (all rows when `None`), projected
    /// to `columns`. `["*"]` returns whole rows; otherwise a row keeps only the
    /// requested keys it actually has, in the requested order.
    pub fn select_rows(
        &self,
        table_name: &str,
        columns: &[String],
        predicate: Option<&RowPredicate<'_>>,
    ) -> Result<Vec<Row>> {
        let table = self.schemas.get_table(table_name)?;
        let mask = match_mask(&table.rows, predicate);
        let whole_rows = is_wildcard(columns);

        let rows: Vec<Row> = table
            .rows
            .into_iter()
            .zip(mask.iter().by_vals())
            .filter(|(_, matched)| *matched)
            .map(|(row, _)| {
                if whole_rows {
                    row
                } else {
                    columns
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| (c.as_str(), v.clone())))
                        .collect()
                }
            })
            .collect();

        debug!(table = table_name, rows = rows.len(), "select");
        Ok(rows)
    }

    /// Writes `updates` over every matching row and returns how many rows
    /// were touched.
    ///
    /// Each updated row is validated against the whole schema, and PRIMARY KEY
    /// / UNIQUE collisions are checked for the updated columns against every
    /// other row. The first failure aborts the statement before anything is
    /// written, so storage keeps the table exactly as it was.
    pub fn update_rows(
        &self,
        table_name: &str,
        updates: &Row,
        predicate: Option<&RowPredicate<'_>>,
    ) -> Result<usize> {
        let mut table = self.schemas.get_table(table_name)?;
        let mask = match_mask(&table.rows, predicate);

        let pk = table
            .primary_key_column()
            .filter(|c| updates.contains_key(&c.name))
            .cloned();
        let unique: Vec<Column> = table
            .columns
            .iter()
            .filter(|c| c.is_unique() && updates.contains_key(&c.name))
            .cloned()
            .collect();

        let mut updated = 0;
        for index in mask.iter_ones() {
            let candidate = table.rows[index]
                .overlaid(updates)
                .ordered_by(&table.columns);
            self.schemas.validate_row(&table, &candidate)?;

            if let Some(pk) = &pk {
                let value = candidate.value(&pk.name);
                if collides(&table.rows, Some(index), &pk.name, &value) {
                    return Err(primary_key_violation(&value));
                }
            }
            for column in &unique {
                if collides(
                    &table.rows,
                    Some(index),
                    &column.name,
                    &candidate.value(&column.name),
                ) {
                    return Err(unique_violation(column));
                }
            }

            table.rows[index] = candidate;
            updated += 1;
        }

        self.storage.save_rows(table_name, &table.rows)?;
        debug!(table = table_name, rows = updated, "update");
        Ok(updated)
    }

    /// Removes the matching rows (every row when `predicate` is `None`) and
    /// returns how many went away.
    pub fn delete_rows(&self, table_name: &str, predicate: Option<&RowPredicate<'_>>) -> Result<usize> {
        let mut table = self.schemas.get_table(table_name)?;
        let before = table.row_count();

        match predicate {
            None => table.rows.clear(),
            Some(_) => {
                let mask = match_mask(&table.rows, predicate);
                let mut matched = mask.iter().by_vals();
                table.rows.retain(|_| !matched.next().unwrap_or(false));
            }
        }

        self.storage.save_rows(table_name, &table.rows)?;
        let deleted = before - table.row_count();
        debug!(table = table_name, rows = deleted, "delete");
        Ok(deleted)
    }

    /// Inner join by nested loop: one combined row per pair whose join values
    /// are equal. Two NULL (or absent) join values are equal, and a NULL is
    /// never equal to anything else. Combined rows are keyed `table.column` for every column of
    /// both schemas. `select_columns` (unless absent or `["*"]`) picks exactly
    /// those qualified keys, NULL where a key is unknown.
    ///
    /// # Errors
    /// [DbError::TableNotFound] for either table, [DbError::ColumnNotFound]
    /// when a join column is not in its table.
    pub fn join_tables(
        &self,
        left_name: &str,
        right_name: &str,
        left_column: &str,
        right_column: &str,
        select_columns: Option<&[String]>,
    ) -> Result<Vec<Row>> {
        let left = self.schemas.get_table(left_name)?;
        let right = self.schemas.get_table(right_name)?;
        require_column(&left, left_column)?;
        require_column(&right, right_column)?;

        let projection = select_columns.filter(|cols| !is_wildcard(cols));
        let mut joined = Vec::new();

        for left_row in &left.rows {
            let key = left_row.value(left_column);
            for right_row in &right.rows {
                if !join_keys_match(&key, &right_row.value(right_column)) {
                    continue;
                }

                let combined = combine(&left, left_row, &right, right_row);
                joined.push(match projection {
                    Some(cols) => cols
                        .iter()
                        .map(|c| (c.as_str(), combined.value(c)))
                        .collect(),
                    None => combined,
                });
            }
        }

        debug!(left = left_name, right = right_name, rows = joined.len(), "join");
        Ok(joined)
    }
}

fn is_wildcard(columns: &[String]) -> bool {
    columns.is_empty() || (columns.len() == 1 && columns[0] == "*")
}

/// One bit per row: set when the row passes `predicate`.
fn match_mask(rows: &[Row], predicate: Option<&RowPredicate<'_>>) -> BitVec {
    match predicate {
        None => bitvec![1; rows.len()],
        Some(matches) => rows.iter().map(|row| matches(row)).collect(),
    }
}

/// Whether a non-NULL `value` already sits in `column` of some row other
/// than `skip`.
fn collides(rows: &[Row], skip: Option<usize>, column: &str, value: &Value) -> bool {
    if value.is_null() {
        return false;
    }
    rows.iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .any(|(_, row)| row.get(column).is_some_and(|v| v.loosely_equals(value)))
}

/// Numeric-aware equality where NULL pairs with NULL.
fn join_keys_match(left: &Value, right: &Value) -> bool {
    match (left.is_null(), right.is_null()) {
        (true, true) => true,
        (false, false) => left.loosely_equals(right),
        _ => false,
    }
}

fn combine(left: &Table, left_row: &Row, right: &Table, right_row: &Row) -> Row {
    let qualify = |table: &Table, row: &Row| -> Vec<(String, Value)> {
        table
            .column_names()
            .map(|c| (format!("{}.{c}", table.name), row.value(c)))
            .collect()
    };
    qualify(left, left_row)
        .into_iter()
        .chain(qualify(right, right_row))
        .collect()
}

fn require_column(table: &Table, column: &str) -> Result<()> {
    match table.get_column(column) {
        Some(_) => Ok(()),
        None => Err(DbError::ColumnNotFound(format!(
            "Column '{column}' does not exist in table '{}'",
            table.name
        ))),
    }
}

fn primary_key_violation(value: &Value) -> DbError {
    DbError::PrimaryKeyViolation(format!(
        "PRIMARY KEY violation: value '{value}' already exists"
    ))
}

fn unique_violation(column: &Column) -> DbError {
    DbError::UniqueViolation(format!(
        "UNIQUE constraint violation on column '{}'",
        column.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::ColumnDef, column::Constraint, memory_storage::MemoryStorage, row};

    fn services() -> (SchemaService, DataService) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let schemas = SchemaService::new(Arc::clone(&storage));
        let data = DataService::new(storage, schemas.clone());
        (schemas, data)
    }

    fn with_users() -> (SchemaService, DataService) {
        let (schemas, data) = services();
        schemas
            .create_table(
                "users",
                &[
                    ColumnDef::new("id", "INTEGER").with_constraint(Constraint::PrimaryKey),
                    ColumnDef::new("name", "VARCHAR").with_max_length(20),
                    ColumnDef::new("email", "VARCHAR")
                        .with_max_length(50)
                        .with_constraint(Constraint::Unique),
                    ColumnDef::new("age", "INTEGER"),
                ],
            )
            .unwrap();
        for (id, name, email, age) in [
            (1, "Alice", "a@x.io", 30),
            (2, "Bob", "b@x.io", 17),
            (3, "Charlie", "c@x.io", 25),
        ] {
            data.insert_row(
                "users",
                row! { "id" => id, "name" => name, "email" => email, "age" => age },
            )
            .unwrap();
        }
        (schemas, data)
    }

    fn all(data: &DataService) -> Vec<Row> {
        data.select_rows("users", &["*".to_string()], None).unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_orders_keys_by_schema() {
        let (_, data) = with_users();
        data.insert_row("users", row! { "age" => 40, "id" => 4 })
            .unwrap();

        let rows = all(&data);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].keys().collect::<Vec<_>>(), vec!["id", "age"]);
    }

    #[test]
    fn test_insert_primary_key_violation() {
        let (_, data) = with_users();
        let err = data
            .insert_row("users", row! { "id" => 1, "email" => "new@x.io" })
            .unwrap_err();

        assert!(matches!(err, DbError::PrimaryKeyViolation(_)));
        assert_eq!(all(&data).len(), 3);
    }

    #[test]
    fn test_insert_unique_violation_and_nulls() {
        let (_, data) = with_users();
        let err = data
            .insert_row("users", row! { "id" => 9, "email" => "b@x.io" })
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));

        // NULLs never collide
        data.insert_row("users", row! { "id" => 10 }).unwrap();
        data.insert_row("users", row! { "id" => 11 }).unwrap();
        assert_eq!(all(&data).len(), 5);
    }

    #[test]
    fn test_insert_validates_first() {
        let (_, data) = with_users();
        let err = data
            .insert_row("users", row! { "id" => 1, "nickname" => "dup" })
            .unwrap_err();
        // unknown column wins over the duplicate key
        assert!(matches!(err, DbError::ColumnNotFound(_)));

        assert!(matches!(
            data.insert_row("ghosts", row! { "id" => 1 }),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_select_projection() {
        let (_, data) = with_users();
        let adults = |row: &Row| row.value("age").compare(&Value::Int(18)) == Some(std::cmp::Ordering::Greater);

        let rows = data
            .select_rows("users", &cols(&["name", "id", "missing"]), Some(&adults))
            .unwrap();

        assert_eq!(
            rows,
            vec![
                row! { "name" => "Alice", "id" => 1 },
                row! { "name" => "Charlie", "id" => 3 },
            ]
        );
    }

    #[test]
    fn test_select_no_match_is_empty() {
        let (_, data) = with_users();
        let nobody = |_: &Row| false;
        assert!(data
            .select_rows("users", &cols(&["*"]), Some(&nobody))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_rows() {
        let (_, data) = with_users();
        let bob = |row: &Row| row.value("id") == Value::Int(2);

        let count = data
            .update_rows("users", &row! { "age" => 18 }, Some(&bob))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(all(&data)[1].value("age"), Value::Int(18));

        let count = data.update_rows("users", &row! { "name" => "X" }, None).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_update_can_keep_own_unique_value() {
        let (_, data) = with_users();
        let alice = |row: &Row| row.value("id") == Value::Int(1);

        let count = data
            .update_rows("users", &row! { "email" => "a@x.io" }, Some(&alice))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_update_violation_leaves_storage_untouched() {
        let (_, data) = with_users();
        let before = all(&data);

        // first row gets id 7, second row then collides with it
        let err = data
            .update_rows("users", &row! { "id" => 7 }, None)
            .unwrap_err();
        assert!(matches!(err, DbError::PrimaryKeyViolation(_)));
        assert_eq!(all(&data), before);

        let err = data
            .update_rows("users", &row! { "email" => "c@x.io" }, None)
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
        assert_eq!(all(&data), before);

        let err = data
            .update_rows("users", &row! { "name" => "far too long for the column" }, None)
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidDataType(_)));
        assert_eq!(all(&data), before);
    }

    #[test]
    fn test_delete_rows() {
        let (_, data) = with_users();
        let minors = |row: &Row| row.value("age") == Value::Int(17);

        assert_eq!(data.delete_rows("users", Some(&minors)).unwrap(), 1);
        assert_eq!(
            all(&data)
                .iter()
                .map(|r| r.value("id"))
                .collect::<Vec<_>>(),
            vec![Value::Int(1), Value::Int(3)]
        );

        assert_eq!(data.delete_rows("users", None).unwrap(), 2);
        assert!(all(&data).is_empty());
    }

    fn with_orders(schemas: &SchemaService, data: &DataService) {
        schemas
            .create_table(
                "orders",
                &[
                    ColumnDef::new("id", "INTEGER").with_constraint(Constraint::PrimaryKey),
                    ColumnDef::new("user_id", "INTEGER"),
                    ColumnDef::new("total", "FLOAT"),
                ],
            )
            .unwrap();
        for (id, user_id, total) in [(10, 1, 9.5), (11, 1, 20.0), (12, 3, 5.25)] {
            data.insert_row(
                "orders",
                row! { "id" => id, "user_id" => user_id, "total" => total },
            )
            .unwrap();
        }
        data.insert_row("orders", row! { "id" => 13 }).unwrap();
    }

    #[test]
    fn test_join_full_rows() {
        let (schemas, data) = with_users();
        with_orders(&schemas, &data);

        let rows = data
            .join_tables("users", "orders", "id", "user_id", None)
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec![
                "users.id",
                "users.name",
                "users.email",
                "users.age",
                "orders.id",
                "orders.user_id",
                "orders.total"
            ]
        );
        assert_eq!(rows[2].value("users.name"), Value::from("Charlie"));
        assert_eq!(rows[2].value("orders.total"), Value::Float(5.25));
    }

    #[test]
    fn test_join_projection() {
        let (schemas, data) = with_users();
        with_orders(&schemas, &data);

        let wanted = cols(&["users.name", "orders.total", "orders.nope"]);
        let rows = data
            .join_tables("users", "orders", "id", "user_id", Some(&wanted))
            .unwrap();

        assert_eq!(
            rows[0],
            row! { "users.name" => "Alice", "orders.total" => 9.5, "orders.nope" => Value::Null }
        );
    }

    #[test]
    fn test_join_without_matches_and_bad_columns() {
        let (schemas, data) = with_users();
        with_orders(&schemas, &data);

        let rows = data
            .join_tables("users", "orders", "age", "id", None)
            .unwrap();
        assert!(rows.is_empty());

        assert!(matches!(
            data.join_tables("users", "orders", "id", "customer", None),
            Err(DbError::ColumnNotFound(_))
        ));
        assert!(matches!(
            data.join_tables("users", "ghosts", "id", "id", None),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_join_pairs_null_keys() {
        let (schemas, data) = services();
        for name in ["a", "b"] {
            schemas
                .create_table(
                    name,
                    &[
                        ColumnDef::new("id", "INTEGER").with_constraint(Constraint::PrimaryKey),
                        ColumnDef::new("k", "INTEGER"),
                    ],
                )
                .unwrap();
        }
        data.insert_row("a", row! { "id" => 1 }).unwrap();
        data.insert_row("a", row! { "id" => 2, "k" => 7 }).unwrap();
        data.insert_row("b", row! { "id" => 3 }).unwrap();
        data.insert_row("b", row! { "id" => 4, "k" => 8 }).unwrap();

        let rows = data.join_tables("a", "b", "k", "k", None).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            row! { "a.id" => 1, "a.k" => Value::Null, "b.id" => 3, "b.k" => Value::Null }
        );
    }

    #[test]
    fn test_join_key_equality() {
        assert!(join_keys_match(&Value::Null, &Value::Null));
        assert!(join_keys_match(&Value::Int(2), &Value::Float(2.0)));
        assert!(!join_keys_match(&Value::Null, &Value::Int(0)));
        assert!(!join_keys_match(&Value::from(""), &Value::Null));
    }
}
