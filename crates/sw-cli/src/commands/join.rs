//! Join command implementation

use anyhow::Result;
use sw_engine::JoinAnalyzer;

use crate::cli::{GlobalArgs, JoinArgs};
use crate::commands::common::prepare;
use crate::render;

/// Execute the join command
pub async fn execute(args: &JoinArgs, global: &GlobalArgs) -> Result<()> {
    let (db, model) = prepare(global, &args.query).await?;

    let analyzer = JoinAnalyzer::new(db.as_ref());
    let report = analyzer.analyze(&model, args.expected_count).await?;

    render::render_join(&report);
    Ok(())
}
