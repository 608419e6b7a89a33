use std::fmt;

use crate::error::{DbError, Result};

/// Represents the smallest meaningful units (atoms) of the SQL language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- SQL Keywords ---
    Create,
    Table,
    Drop,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Inner,
    Join,
    On,
    Primary,
    Key,
    Unique,
    Not,
    Null,

    // --- Data Types ---
    Integer,
    Varchar,
    Float,
    Boolean,
    Date,

    // --- Identifiers & Literals ---
    /// A name representing a table or a column (e.g., `users`, `id`).
    Ident(String),
    /// An unsigned digit sequence, kept as written (e.g., `42`, `007`).
    Number(String),
    /// A string literal between single or double quotes (e.g., `'Alice'`).
    String(String),

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Wildcard `*`
    Star,
    /// Qualifier separator `.`
    Dot,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Lower,
    /// `<=`
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Create => "CREATE",
            Self::Table => "TABLE",
            Self::Drop => "DROP",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Inner => "INNER",
            Self::Join => "JOIN",
            Self::On => "ON",
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
            Self::Unique => "UNIQUE",
            Self::Not => "NOT",
            Self::Null => "NULL",
            Self::Integer => "INTEGER",
            Self::Varchar => "VARCHAR",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Ident(name) => return write!(f, "identifier '{name}'"),
            Self::Number(digits) => return write!(f, "number {digits}"),
            Self::String(s) => return write!(f, "string '{s}'"),
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Star => "'*'",
            Self::Dot => "'.'",
            Self::Equal => "'='",
            Self::NotEqual => "'!='",
            Self::Greater => "'>'",
            Self::GreaterEqual => "'>='",
            Self::Lower => "'<'",
            Self::LowerEqual => "'<='",
            Self::Eof => "end of input",
        };
        f.write_str(text)
    }
}

impl Token {
    /// Keywords and type names. Where a table or column name is expected the
    /// parser takes these as plain names.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Create
                | Self::Table
                | Self::Drop
                | Self::Insert
                | Self::Into
                | Self::Values
                | Self::Select
                | Self::From
                | Self::Where
                | Self::Update
                | Self::Set
                | Self::Delete
                | Self::Inner
                | Self::Join
                | Self::On
                | Self::Primary
                | Self::Key
                | Self::Unique
                | Self::Not
                | Self::Null
                | Self::Integer
                | Self::Varchar
                | Self::Float
                | Self::Boolean
                | Self::Date
        )
    }
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens, always
    /// terminated by [Token::Eof].
    ///
    /// # Errors
    /// Returns [DbError::Parse] if an unsupported character is encountered or
    /// a string literal is not terminated.
    ///
    /// # Example
    /// ```
    /// # use minidb::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT *");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens[0], Token::Select);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        Ok(self
            .tokenize_spelled()?
            .into_iter()
            .map(|(token, _)| token)
            .collect())
    }

    /// Same as [Tokenizer::tokenize], pairing every token with the source text
    /// it was read from. [Token::Eof] gets an empty spelling.
    pub fn tokenize_spelled(&mut self) -> Result<Vec<(Token, String)>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let start = self.position;
            let token = self.next_token()?;
            let spelling = self.input[start..self.position].iter().collect();
            tokens.push((token, spelling));
        }

        tokens.push((Token::Eof, String::new()));
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '*' => self.single(Token::Star),
            '.' => self.single(Token::Dot),
            '=' => self.single(Token::Equal),
            '>' => Ok(self.with_optional_equal(Token::Greater, Token::GreaterEqual)),
            '<' => Ok(self.with_optional_equal(Token::Lower, Token::LowerEqual)),
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(Token::NotEqual)
                } else {
                    Err(DbError::Parse("Expected '=' after '!'".into()))
                }
            }
            '\'' | '"' => self.read_string(ch),
            c if c.is_ascii_alphabetic() => Ok(self.read_identifier()),
            c if c.is_ascii_digit() => Ok(self.read_number()),
            _ => Err(DbError::Parse(format!(
                "Unexpected character {ch:?} at position {}",
                self.position
            ))),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    /// `>` / `>=` and `<` / `<=` share their first character.
    fn with_optional_equal(&mut self, bare: Token, with_equal: Token) -> Token {
        self.advance();
        if self.peek_char() == Some('=') {
            self.advance();
            with_equal
        } else {
            bare
        }
    }

    // --- Extraction Logic ---

    /// Reads a letter followed by letters, digits or underscores, and
    /// determines if it's a SQL keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively. Their written form survives
    /// through [Tokenizer::tokenize_spelled].
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_ascii_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "TABLE" => Token::Table,
            "DROP" => Token::Drop,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "UPDATE" => Token::Update,
            "SET" => Token::Set,
            "DELETE" => Token::Delete,
            "INNER" => Token::Inner,
            "JOIN" => Token::Join,
            "ON" => Token::On,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "UNIQUE" => Token::Unique,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "INTEGER" => Token::Integer,
            "VARCHAR" => Token::Varchar,
            "FLOAT" => Token::Float,
            "BOOLEAN" => Token::Boolean,
            "DATE" => Token::Date,
            _ => Token::Ident(ident),
        }
    }

    /// Reads an unsigned digit sequence. Signs and decimal points are not part
    /// of the literal grammar.
    fn read_number(&mut self) -> Token {
        let mut number = String::new();

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            number.push(self.current_char());
            self.advance();
        }

        Token::Number(number)
    }

    /// Reads a string literal enclosed in `quote`. There is no escape syntax.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(DbError::Parse(format!("Unterminated string {quote}{string}")));
        }

        // Skip the closing quote
        self.advance();

        Ok(Token::String(string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let mut tokenizer = Tokenizer::new("CREATE TABLE users");
        let tokens = tokenizer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Create,
                Token::Table,
                Token::Ident("users".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = Tokenizer::new("select FrOm wHeRe").tokenize().unwrap();
        assert_eq!(tokens, vec![Token::Select, Token::From, Token::Where, Token::Eof]);
    }

    #[test]
    fn test_tokenize_create_table() {
        let mut tokenizer =
            Tokenizer::new("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50))");
        let tokens = tokenizer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Create,
                Token::Table,
                Token::Ident("users".into()),
                Token::LeftParen,
                Token::Ident("id".into()),
                Token::Integer,
                Token::Primary,
                Token::Key,
                Token::Comma,
                Token::Ident("name".into()),
                Token::Varchar,
                Token::LeftParen,
                Token::Number("50".into()),
                Token::RightParen,
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        let tokens = Tokenizer::new("= != > < >= <=").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Equal,
                Token::NotEqual,
                Token::Greater,
                Token::Lower,
                Token::GreaterEqual,
                Token::LowerEqual,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_have_no_decimal_point() {
        let tokens = Tokenizer::new("1.5").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("1".into()),
                Token::Dot,
                Token::Number("5".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_strings() {
        let mut tokenizer = Tokenizer::new(r#"'Alice', "Bob Dylan", ''"#);
        let tokens = tokenizer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::String("Alice".into()),
                Token::Comma,
                Token::String("Bob Dylan".into()),
                Token::Comma,
                Token::String("".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_qualified_name() {
        let tokens = Tokenizer::new("users.id").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("users".into()),
                Token::Dot,
                Token::Ident("id".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Tokenizer::new("'hello").tokenize().is_err());
        assert!(Tokenizer::new("\"hello'").tokenize().is_err());
    }

    #[test]
    fn test_unsupported_characters() {
        assert!(matches!(Tokenizer::new("a - b").tokenize(), Err(DbError::Parse(_))));
        assert!(Tokenizer::new("_id").tokenize().is_err());
        assert!(Tokenizer::new("a ! b").tokenize().is_err());
    }

    #[test]
    fn test_spellings_follow_the_source() {
        let tokens = Tokenizer::new("select Date,key.id from 'x'").tokenize_spelled().unwrap();
        let spellings: Vec<&str> = tokens.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(
            spellings,
            vec!["select", "Date", ",", "key", ".", "id", "from", "'x'", ""]
        );
        assert_eq!(tokens[1].0, Token::Date);
        assert!(tokens[1].0.is_keyword());
        assert!(!tokens[5].0.is_keyword());
        assert_eq!(tokens[8].0, Token::Eof);
    }
}
