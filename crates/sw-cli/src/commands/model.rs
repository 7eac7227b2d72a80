//! Model command implementation: print the parsed query model

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, ModelArgs, ModelOutput};
use crate::commands::common::parse_model;
use crate::render::print_table;

/// Execute the model command. Parsing only; the database is never opened.
pub async fn execute(args: &ModelArgs, global: &GlobalArgs) -> Result<()> {
    let model = parse_model(global, &args.query)?;

    match args.output {
        ModelOutput::Json => {
            let json = serde_json::to_string_pretty(&model)
                .context("Failed to serialize query model")?;
            println!("{}", json);
        }
        ModelOutput::Pretty => {
            println!("Relations:");
            let rows: Vec<Vec<String>> = model
                .relations
                .iter()
                .map(|r| vec![r.alias.clone(), r.table.clone()])
                .collect();
            print_table(&["ALIAS", "TABLE"], &rows);
            println!();

            if !model.join_edges.is_empty() {
                println!("Join edges:");
                let rows: Vec<Vec<String>> = model
                    .join_edges
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        vec![
                            i.to_string(),
                            e.condition_sql(),
                            e.kind.as_sql().to_string(),
                        ]
                    })
                    .collect();
                print_table(&["#", "CONDITION", "KIND"], &rows);
                println!();
            }

            if let Some(predicate) = &model.predicate {
                println!("Predicate: {}", predicate.to_sql());
                println!("Conjuncts:");
                for (i, conjunct) in predicate.leaves().iter().enumerate() {
                    println!("  [{}] {}", i, conjunct.sql);
                }
                println!();
            }

            if let Some(agg) = &model.aggregate {
                println!("Aggregate: {}", agg.call_sql());
                if !agg.group_by.is_empty() {
                    println!("Group by: {}", agg.group_by.join(", "));
                }
                println!();
            }

            println!("Projection: {}", model.projection.join(", "));
        }
    }

    Ok(())
}
