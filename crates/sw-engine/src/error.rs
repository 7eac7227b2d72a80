//! Error types for sw-engine
//!
//! The four-kind taxonomy callers switch on: unsupported shape, invalid
//! parameter, unreachable tuple, failed diagnostic query. Every analyzer
//! either returns a complete result or fails with one of these; a single
//! sub-query failure aborts the whole analysis.

use sw_db::DbError;
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// E001: Query Model contains a construct the engine cannot rewrite
    #[error("[E001] Unsupported query shape: {construct}")]
    UnsupportedShape { construct: String },

    /// E002: Missing or malformed mode parameter; no query was executed
    #[error("[E002] Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// E003: Why-not search exhausted without admitting the target tuple
    #[error("[E003] Target tuple unreachable: {target} ({detail})")]
    TupleUnreachable { target: String, detail: String },

    /// E004: A diagnostic query failed on the database side
    #[error("[E004] {0}")]
    Db(#[from] DbError),
}

impl EngineError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        EngineError::UnsupportedShape {
            construct: construct.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            message: message.into(),
        }
    }
}

impl From<sw_core::CoreError> for EngineError {
    fn from(err: sw_core::CoreError) -> Self {
        match err {
            sw_core::CoreError::UnsupportedShape { construct } => {
                EngineError::UnsupportedShape { construct }
            }
        }
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
