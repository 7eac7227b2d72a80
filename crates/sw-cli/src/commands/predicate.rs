//! Predicate command implementation

use anyhow::Result;
use sw_engine::PredicateAnalyzer;

use crate::cli::{GlobalArgs, PredicateArgs};
use crate::commands::common::{prepare, split_key_columns};
use crate::render;

/// Execute the predicate command
pub async fn execute(args: &PredicateArgs, global: &GlobalArgs) -> Result<()> {
    let (db, model) = prepare(global, &args.query).await?;
    let key_columns = split_key_columns(Some(args.key.as_str()));

    let analyzer = PredicateAnalyzer::new(db.as_ref());
    let report = analyzer.analyze(&model, &key_columns).await?;

    render::render_predicate(&report);
    Ok(())
}
