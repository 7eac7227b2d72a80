//! Shared command helpers: connection, seeding, model building

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use sw_core::QueryModel;
use sw_db::{DuckDbAdapter, ExecutionAdapter};
use sw_sql::{build_query_model, SqlParser};

use crate::cli::GlobalArgs;

/// Open the session's database connection. It is acquired once per
/// invocation, used read-only by the engine, and dropped on exit.
pub(crate) fn connect(global: &GlobalArgs) -> Result<Arc<dyn ExecutionAdapter>> {
    let db: Arc<dyn ExecutionAdapter> =
        Arc::new(DuckDbAdapter::new(&global.database).context("Failed to connect to database")?);
    if global.verbose {
        eprintln!(
            "[verbose] Connected to {} ({})",
            global.database,
            db.backend_name()
        );
    }
    Ok(db)
}

/// Seed tables from `--load TABLE=FILE` options, in the given order.
pub(crate) async fn seed_csv(db: &Arc<dyn ExecutionAdapter>, global: &GlobalArgs) -> Result<()> {
    for entry in &global.load {
        let Some((table, path)) = entry.split_once('=') else {
            bail!("Invalid --load value '{}': expected TABLE=FILE", entry);
        };
        db.load_csv(table.trim(), path.trim())
            .await
            .with_context(|| format!("Failed to load '{}' into table '{}'", path, table))?;
        if global.verbose {
            eprintln!("[verbose] Loaded {} into table {}", path, table);
        }
    }
    Ok(())
}

/// Parse the query text and lower it into the Query Model.
pub(crate) fn parse_model(global: &GlobalArgs, query: &str) -> Result<QueryModel> {
    let parser = SqlParser::from_dialect_name(&global.dialect).context("Invalid SQL dialect")?;
    let statement = parser
        .parse_single(query)
        .context("Failed to parse query")?;
    let model = build_query_model(&statement).context("Query is outside the supported shapes")?;
    if global.verbose {
        eprintln!(
            "[verbose] Query model: {} relation(s), {} join edge(s), {} conjunct(s)",
            model.relations.len(),
            model.join_edges.len(),
            model.conjuncts().len()
        );
    }
    Ok(model)
}

/// Connect, seed CSVs, and build the model in one step.
pub(crate) async fn prepare(
    global: &GlobalArgs,
    query: &str,
) -> Result<(Arc<dyn ExecutionAdapter>, QueryModel)> {
    let db = connect(global)?;
    seed_csv(&db, global).await?;
    let model = parse_model(global, query)?;
    Ok((db, model))
}

/// Split a comma-separated `--key` value into column expressions.
pub(crate) fn split_key_columns(key: Option<&str>) -> Vec<String> {
    key.map(|k| {
        k.split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
