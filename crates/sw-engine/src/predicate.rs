//! Per-conjunct predicate attribution
//!
//! Each conjunct is evaluated in isolation over the full FROM/JOIN: a
//! tuple's verdict for conjunct i is its membership in that
//! single-conjunct result set. The declared AND/OR tree is then evaluated
//! bottom-up over the leaf verdicts, pure boolean work with no further
//! database access, which reconstructs why each tuple was included or
//! excluded even under nested connectives.

use crate::error::{EngineError, EngineResult};
use crate::synth::{run, QuerySynthesizer};
use std::collections::HashSet;
use sw_core::{PredicateReport, PredicateVerdict, QueryModel, RowSet, Value};
use sw_db::ExecutionAdapter;

pub struct PredicateAnalyzer<'a> {
    db: &'a dyn ExecutionAdapter,
    synth: QuerySynthesizer,
}

impl<'a> PredicateAnalyzer<'a> {
    pub fn new(db: &'a dyn ExecutionAdapter) -> Self {
        Self {
            db,
            synth: QuerySynthesizer::new(),
        }
    }

    /// Attribute each tuple's filtering outcome to individual conjuncts.
    /// `key_columns` must identify tuples across the full FROM/JOIN.
    pub async fn analyze(
        &self,
        model: &QueryModel,
        key_columns: &[String],
    ) -> EngineResult<PredicateReport> {
        let predicate = model
            .predicate
            .as_ref()
            .ok_or_else(|| EngineError::invalid("query has no WHERE predicates to analyze"))?;
        if key_columns.is_empty() {
            return Err(EngineError::invalid(
                "predicate analysis requires key columns identifying result tuples",
            ));
        }

        let conjuncts = model.conjuncts();

        let universe = run(self.db, self.synth.predicate_universe(model, key_columns)?).await?;

        // One membership set per conjunct, in leaf order
        let mut conjunct_sets: Vec<HashSet<Vec<String>>> = Vec::with_capacity(conjuncts.len());
        for index in 0..conjuncts.len() {
            let rows = run(
                self.db,
                self.synth.single_conjunct(model, key_columns, index)?,
            )
            .await?;
            conjunct_sets.push(key_set(&rows));
        }

        let full = key_set(&run(self.db, self.synth.full_predicate(model, key_columns)?).await?);

        let mut verdicts: Vec<PredicateVerdict> = universe
            .rows
            .iter()
            .map(|row| {
                let key: Vec<String> = row.iter().map(Value::to_string).collect();
                let leaf_values: Vec<bool> =
                    conjunct_sets.iter().map(|set| set.contains(&key)).collect();
                let overall = predicate.evaluate(&leaf_values);
                let included = full.contains(&key);
                PredicateVerdict {
                    key,
                    conjuncts: leaf_values,
                    overall,
                    included,
                }
            })
            .collect();
        verdicts.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(PredicateReport {
            conjunct_sql: conjuncts.iter().map(|c| c.sql.clone()).collect(),
            verdicts,
        })
    }
}

fn key_set(rows: &RowSet) -> HashSet<Vec<String>> {
    rows.rows
        .iter()
        .map(|row| row.iter().map(Value::to_string).collect())
        .collect()
}

#[cfg(test)]
#[path = "predicate_test.rs"]
mod tests;
