use crate::{
    ast::*,
    column::Constraint,
    error::{DbError, Result},
    tokenizer::{Token, Tokenizer},
    value::Value,
};

/// Parses one SQL statement. A trailing `;` is optional, and the whole input
/// must be consumed.
///
/// # Example
/// ```
/// use minidb::parser::parse;
/// use minidb::ast::Statement;
///
/// let statement = parse("DROP TABLE users;").unwrap();
/// assert!(matches!(statement, Statement::DropTable(_)));
/// ```
pub fn parse(sql: &str) -> Result<Statement> {
    let tokens = Tokenizer::new(sql).tokenize_spelled()?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    /// Source text of each token, read back when a keyword names a table or column.
    spellings: Vec<String>,
    position: usize,
}

impl Parser {
    /// Appends [Token::Eof] when `tokens` does not already end with it.
    fn new(tokens: Vec<(Token, String)>) -> Self {
        let (mut tokens, mut spellings): (Vec<Token>, Vec<String>) = tokens.into_iter().unzip();
        if tokens.last() != Some(&Token::Eof) {
            tokens.push(Token::Eof);
            spellings.push(String::new());
        }
        Self {
            tokens,
            spellings,
            position: 0,
        }
    }

    fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current_token() {
            Token::Create => self.parse_create_table(),
            Token::Drop => self.parse_drop_table(),
            Token::Insert => self.parse_insert(),
            Token::Select => self.parse_select(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            other => Err(DbError::Parse(format!(
                "Expected CREATE, DROP, INSERT, SELECT, UPDATE or DELETE, found {other}"
            ))),
        }?;

        // trailing semicolons are stripped
        while matches!(self.current_token(), Token::Semicolon) {
            self.advance();
        }

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(DbError::Parse(format!(
                "Unexpected {} after statement",
                self.current_token()
            )));
        }

        Ok(statement)
    }

    //helpers
    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    /// Consumes `token` if it is next, reporting whether it did.
    fn consume_if(&mut self, token: Token) -> bool {
        if *self.current_token() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> DbError {
        DbError::Parse(format!("Expected {expected}, found {}", self.current_token()))
    }

    /// A plain identifier, or a keyword used as a name in the case it was written.
    fn consume_ident(&mut self) -> Result<String> {
        let name = match self.current_token() {
            Token::Ident(string) => string.clone(),
            token if token.is_keyword() => self.spellings[self.position].clone(),
            _ => return Err(self.unexpected("identifier")),
        };
        self.advance();
        Ok(name)
    }

    /// `name` or `table.name`, the latter kept joined by a dot.
    fn consume_column_ref(&mut self) -> Result<String> {
        let name = self.consume_ident()?;
        if self.consume_if(Token::Dot) {
            let column = self.consume_ident()?;
            return Ok(format!("{name}.{column}"));
        }
        Ok(name)
    }

    /// A quoted string or an unsigned number, run through the
    /// int -> float -> string ladder.
    fn consume_literal(&mut self) -> Result<Value> {
        let text = match self.current_token() {
            Token::String(s) | Token::Number(s) => s.clone(),
            _ => return Err(self.unexpected("a string or number literal")),
        };
        self.advance();
        Ok(Value::from_literal(&text))
    }

    fn consume_comparison_op(&mut self) -> Result<ComparisonOp> {
        let op = match self.current_token() {
            Token::Equal => ComparisonOp::Eq,
            Token::NotEqual => ComparisonOp::NotEq,
            Token::Greater => ComparisonOp::Gt,
            Token::Lower => ComparisonOp::Lt,
            Token::GreaterEqual => ComparisonOp::GtEq,
            Token::LowerEqual => ComparisonOp::LtEq,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    /// Parses `name TYPE [constraint...]`, returning the type as written.
    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.consume_ident()?;

        let mut column = match self.current_token() {
            Token::Integer | Token::Float | Token::Boolean | Token::Date => {
                let type_name = self.current_token().to_string();
                self.advance();
                ColumnDef::new(name, type_name)
            }
            Token::Varchar => {
                self.advance();
                self.consume(Token::LeftParen)?;
                let max_length = self.parse_length()?;
                self.consume(Token::RightParen)?;
                ColumnDef::new(name, "VARCHAR").with_max_length(max_length)
            }
            _ => return Err(self.unexpected("a column type")),
        };

        loop {
            let constraint = match self.current_token() {
                Token::Primary => {
                    self.advance();
                    self.consume(Token::Key)?;
                    Constraint::PrimaryKey
                }
                Token::Unique => {
                    self.advance();
                    Constraint::Unique
                }
                Token::Not => {
                    self.advance();
                    self.consume(Token::Null)?;
                    Constraint::NotNull
                }
                _ => break,
            };
            column = column.with_constraint(constraint);
        }

        Ok(column)
    }

    fn parse_length(&mut self) -> Result<usize> {
        let Token::Number(digits) = self.current_token() else {
            return Err(self.unexpected("a VARCHAR length"));
        };
        let length = digits
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| DbError::Parse(format!("Invalid VARCHAR length {digits}")))?;
        self.advance();
        Ok(length)
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.consume(Token::Create)?; // advance if CREATE
        self.consume(Token::Table)?; // advance if TABLE
        let table_name = self.consume_ident()?;
        self.consume(Token::LeftParen)?;
        let mut columns = vec![];
        loop {
            columns.push(self.parse_column_def()?);
            match self.current_token() {
                Token::RightParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    continue;
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
        Ok(Statement::CreateTable(CreateTable {
            table_name,
            columns,
        }))
    }

    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.consume(Token::Drop)?;
        self.consume(Token::Table)?;
        let table_name = self.consume_ident()?;
        Ok(Statement::DropTable(DropTable { table_name }))
    }

    /// Parses `( item, item, ... )` with `item` read by `parse_item`.
    fn parse_parenthesized<T>(
        &mut self,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.consume(Token::LeftParen)?;
        let mut items = vec![parse_item(&mut *self)?];
        while self.consume_if(Token::Comma) {
            items.push(parse_item(&mut *self)?);
        }
        self.consume(Token::RightParen)?;
        Ok(items)
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table_name = self.consume_ident()?;

        let columns = self.parse_parenthesized(Self::consume_ident)?;
        self.consume(Token::Values)?;
        let values = self.parse_parenthesized(Self::consume_literal)?;

        if columns.len() != values.len() {
            return Err(DbError::Parse(format!(
                "INSERT names {} column(s) but supplies {} value(s)",
                columns.len(),
                values.len()
            )));
        }

        Ok(Statement::Insert(Insert {
            table_name,
            columns,
            values,
        }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.consume(Token::Select)?;

        let columns = if self.consume_if(Token::Star) {
            ColumnsSelect::Star
        } else {
            let mut names = vec![self.consume_column_ref()?];
            while self.consume_if(Token::Comma) {
                names.push(self.consume_column_ref()?);
            }
            ColumnsSelect::ColumnsNames(names)
        };

        self.consume(Token::From)?;
        let table_name = self.consume_ident()?;

        let source = match self.current_token() {
            Token::Inner => SelectSource::Join(self.parse_join(table_name)?),
            _ => SelectSource::Table {
                table_name,
                where_clause: self.parse_where()?,
            },
        };

        Ok(Statement::Select(Select { columns, source }))
    }

    fn parse_join(&mut self, left_table: String) -> Result<JoinClause> {
        self.consume(Token::Inner)?;
        self.consume(Token::Join)?;
        let right_table = self.consume_ident()?;
        self.consume(Token::On)?;

        let left_ref = self.consume_ident()?;
        self.consume(Token::Dot)?;
        let left_column = self.consume_ident()?;
        self.consume(Token::Equal)?;
        let right_ref = self.consume_ident()?;
        self.consume(Token::Dot)?;
        let right_column = self.consume_ident()?;

        Ok(JoinClause {
            left_table,
            right_table,
            left_ref,
            left_column,
            right_ref,
            right_column,
        })
    }

    /// Parses an optional `WHERE column op literal`.
    fn parse_where(&mut self) -> Result<Option<WhereClause>> {
        if !self.consume_if(Token::Where) {
            return Ok(None);
        }
        let column = self.consume_ident()?;
        let op = self.consume_comparison_op()?;
        let value = self.consume_literal()?;
        Ok(Some(WhereClause { column, op, value }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.consume(Token::Update)?;
        let table_name = self.consume_ident()?;
        self.consume(Token::Set)?;
        let column = self.consume_ident()?;
        self.consume(Token::Equal)?;
        let value = self.consume_literal()?;
        let where_clause = self.parse_where()?;

        Ok(Statement::Update(Update {
            table_name,
            set: Assignment { column, value },
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.consume(Token::Delete)?;
        self.consume(Token::From)?;
        let table_name = self.consume_ident()?;
        let where_clause = self.parse_where()?;
        Ok(Statement::Delete(Delete {
            table_name,
            where_clause,
        }))
    }
}
