//! Why-not command implementation

use anyhow::Result;
use sw_engine::{TargetTuple, WhyNotAnalyzer};

use crate::cli::{GlobalArgs, WhyNotArgs};
use crate::commands::common::prepare;
use crate::render;

/// Execute the why-not command
pub async fn execute(args: &WhyNotArgs, global: &GlobalArgs) -> Result<()> {
    let (db, model) = prepare(global, &args.query).await?;

    let target = TargetTuple {
        table: args.table.clone(),
        key_predicate: args.key.clone(),
    };

    let analyzer = WhyNotAnalyzer::new(db.as_ref());
    let explanation = analyzer.analyze(&model, &target).await?;

    render::render_why_not(&explanation, args.output);
    Ok(())
}
