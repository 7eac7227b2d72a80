//! Execution adapter trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sw_core::RowSet;

/// Database abstraction the explanation engine executes against.
///
/// An instance is passed explicitly into every analyzer; there is no
/// process-wide connection state. Implementations must be Send + Sync.
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    /// Execute a SELECT statement and return its rows in result order.
    async fn query(&self, sql: &str) -> DbResult<RowSet>;

    /// Execute multiple SQL statements (fixtures, seeding)
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Load a CSV file into a table, replacing it if present
    async fn load_csv(&self, table: &str, path: &str) -> DbResult<()>;

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}
