//! Error types for sw-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002). Diagnostic queries are deterministic,
    /// so the failure is surfaced with the SQL text instead of retried.
    #[error("[D002] SQL execution failed: {message}\n  failing SQL: {sql}")]
    ExecutionError { message: String, sql: String },

    /// CSV loading error (D003)
    #[error("[D003] CSV load failed: {0}")]
    CsvError(String),
}

impl DbError {
    pub fn execution(message: impl Into<String>, sql: impl Into<String>) -> Self {
        DbError::ExecutionError {
            message: message.into(),
            sql: sql.into(),
        }
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
