//! DuckDB execution adapter implementation

use crate::error::{DbError, DbResult};
use crate::traits::ExecutionAdapter;
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::Mutex;
use sw_core::{RowSet, Value};

/// DuckDB execution adapter
pub struct DuckDbAdapter {
    conn: Mutex<Connection>,
}

impl DuckDbAdapter {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Run a SELECT synchronously, collecting all rows
    fn query_sync(&self, sql: &str) -> DbResult<RowSet> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbError::execution(e.to_string(), sql))?;

        // DuckDB panics on `stmt.column_count()` before execution, so rows
        // are collected first and column metadata read afterwards.
        let rows: Vec<Vec<Value>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count).map(|i| column_value(row, i)).collect())
            })
            .map_err(|e| DbError::execution(e.to_string(), sql))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::execution(e.to_string(), sql))?;

        let column_count = stmt.column_count();
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map_or("?".to_string(), |v| v.to_string())
            })
            .collect();

        Ok(RowSet { columns, rows })
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)
            .map_err(|e| DbError::execution(e.to_string(), sql))
    }
}

/// Read a column value, trying typed gets in order.
///
/// DuckDB answers `None` for mismatched target types, so the chain
/// String -> i64 -> f64 -> bool falls through to the variant that fits.
fn column_value(row: &duckdb::Row<'_>, idx: usize) -> Value {
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Value::Text(s);
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Value::Int(n);
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return Value::Float(f);
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return Value::Bool(b);
    }
    Value::Null
}

#[async_trait]
impl ExecutionAdapter for DuckDbAdapter {
    async fn query(&self, sql: &str) -> DbResult<RowSet> {
        self.query_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn load_csv(&self, table: &str, path: &str) -> DbResult<()> {
        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto('{}')",
            table, path
        );
        self.execute_batch_sync(&sql)
            .map_err(|e| DbError::CsvError(format!("{}: {}", path, e)))
    }

    fn backend_name(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
