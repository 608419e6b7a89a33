use std::{cmp::Ordering, fmt};

use crate::{column::Constraint, value::Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    DropTable(DropTable),
    Insert(Insert),
    Select(Select),
    Update(Update),
    Delete(Delete),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

/// A column as written in `CREATE TABLE`, before the schema layer resolves
/// its type name.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: String,
    pub max_length: Option<usize>,
    pub constraints: Vec<Constraint>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            max_length: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table_name: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnsSelect {
    Star,
    ColumnsNames(Vec<String>),
}

impl ColumnsSelect {
    /// The projection as a list of names, `*` included.
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::Star => vec!["*".to_string()],
            Self::ColumnsNames(names) => names.clone(),
        }
    }
}

/// Where a `SELECT` reads from: one table with an optional filter, or an
/// inner join of two tables. The grammar does not allow both at once.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectSource {
    Table {
        table_name: String,
        where_clause: Option<WhereClause>,
    },
    Join(JoinClause),
}

/// `FROM left INNER JOIN right ON left_ref.left_column = right_ref.right_column`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub left_table: String,
    pub right_table: String,
    pub left_ref: String,
    pub left_column: String,
    pub right_ref: String,
    pub right_column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: ColumnsSelect,
    pub source: SelectSource,
}

/// A single `column operator literal` predicate. There is no AND/OR.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub column: String,
    pub op: ComparisonOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl ComparisonOp {
    /// Applies the operator to the outcome of a comparison. Incomparable
    /// operands (`None`) only satisfy `!=`.
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        match self {
            Self::Eq => ordering == Some(Ordering::Equal),
            Self::NotEq => ordering != Some(Ordering::Equal),
            Self::Gt => ordering == Some(Ordering::Greater),
            Self::Lt => ordering == Some(Ordering::Less),
            Self::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Self::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::GtEq => ">=",
            Self::LtEq => "<=",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table_name: String,
    pub set: Assignment,
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table_name: String,
    pub where_clause: Option<WhereClause>,
}
