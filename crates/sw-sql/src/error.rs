//! Error types for sw-sql

use thiserror::Error;

/// SQL parsing and model-building errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// S001: SQL parse error
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// S002: Empty SQL
    #[error("[S002] SQL is empty")]
    EmptySql,

    /// S003: Query outside the supported grammar
    #[error("[S003] Unsupported query shape: {construct}")]
    UnsupportedShape { construct: String },

    /// S004: Unknown dialect name
    #[error("[S004] Unknown SQL dialect: {0}")]
    UnknownDialect(String),
}

impl From<sw_core::CoreError> for SqlError {
    fn from(err: sw_core::CoreError) -> Self {
        match err {
            sw_core::CoreError::UnsupportedShape { construct } => {
                SqlError::UnsupportedShape { construct }
            }
        }
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
