//! sw-sql - SQL parsing layer for sqlwhy
//!
//! This crate parses raw query text with sqlparser-rs (dialect-aware) and
//! lowers the AST into the semantic [`sw_core::QueryModel`] the analyzers
//! operate on. Queries outside the supported grammar are rejected here,
//! before any diagnostic SQL is synthesized.

pub mod builder;
pub mod dialect;
pub mod error;
pub mod parser;

pub use builder::build_query_model;
pub use dialect::{DuckDbDialect, PostgresDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use parser::SqlParser;
