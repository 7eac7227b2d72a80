//! Error types for sw-core

use thiserror::Error;

/// Core error type for sqlwhy
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Query Model contains a construct outside the supported grammar
    #[error("[C001] Unsupported query shape: {construct}")]
    UnsupportedShape { construct: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
