//! sw-db - Execution adapter layer for sqlwhy
//!
//! This crate provides the `ExecutionAdapter` trait the engine runs its
//! diagnostic queries through, and the DuckDB implementation bundled with
//! the CLI. The engine only ever issues SELECT-shaped statements; the
//! mutating entry points exist for seeding data in tests and from CSVs.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbAdapter;
pub use error::{DbError, DbResult};
pub use traits::ExecutionAdapter;
