pub mod ast;
pub mod column;
pub mod config;
pub mod data_service;
pub mod data_type;
pub mod error;
pub mod executor;
pub mod file_storage;
pub mod memory_storage;
pub mod parser;
pub mod row;
pub mod schema_service;
pub mod storage;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use column::{Column, Constraint};
pub use config::Config;
pub use data_service::DataService;
pub use data_type::DataType;
pub use error::{DbError, Result};
pub use executor::{Predicate, QueryExecutor, QueryResult};
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use parser::parse;
pub use row::Row;
pub use schema_service::SchemaService;
pub use storage::Storage;
pub use table::{Schema, Table};
pub use value::Value;
