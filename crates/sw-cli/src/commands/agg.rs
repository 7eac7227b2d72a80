//! Agg command implementation

use anyhow::Result;
use sw_engine::{synth, AggregateAnalyzer, QuerySynthesizer};

use crate::cli::{AggArgs, GlobalArgs};
use crate::commands::common::{prepare, split_key_columns};
use crate::render;

/// Execute the agg command
pub async fn execute(args: &AggArgs, global: &GlobalArgs) -> Result<()> {
    let (db, model) = prepare(global, &args.query).await?;
    let key_columns = split_key_columns(args.key.as_deref());

    if global.verbose {
        let original = QuerySynthesizer::new().original_query(&model)?;
        let rows = synth::run(db.as_ref(), original).await?;
        println!("Original query result:");
        render::print_rowset(&rows, 20);
        println!();
    }

    let analyzer = AggregateAnalyzer::new(db.as_ref());
    let report = analyzer
        .analyze(&model, args.expected.value(), &key_columns)
        .await?;

    render::render_aggregate(&report);
    Ok(())
}
