//! Minimal-relaxation why-not analysis
//!
//! Searches subsets of the query's constraints (WHERE conjuncts and join
//! edges) in increasing size and lexicographic index order, testing for
//! each subset whether dropping it admits the target tuple. The first
//! success is the minimal explanation under the search order. Complexity
//! is exponential in the constraint count, which is bounded by the query's
//! own syntactic size and capped explicitly below.

use crate::error::{EngineError, EngineResult};
use crate::synth::{run, QuerySynthesizer};
use std::collections::{BTreeSet, HashMap};
use sw_core::{QueryModel, Relation, SearchStep, Value, WhyNotExplanation};
use sw_db::ExecutionAdapter;

/// Hard cap on conjuncts + join edges for the subset search. 2^12 relaxed
/// queries is the worst case the tool will issue for one analysis.
pub const MAX_RELAXATION_CANDIDATES: usize = 12;

/// The tuple the analyst expected to see.
///
/// `table` names a relation of the query (table name or alias);
/// `key_predicate` identifies the tuple's row in it, e.g. `order_id = 5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTuple {
    pub table: String,
    pub key_predicate: String,
}

pub struct WhyNotAnalyzer<'a> {
    db: &'a dyn ExecutionAdapter,
    synth: QuerySynthesizer,
}

impl<'a> WhyNotAnalyzer<'a> {
    pub fn new(db: &'a dyn ExecutionAdapter) -> Self {
        Self {
            db,
            synth: QuerySynthesizer::new(),
        }
    }

    /// Find the smallest constraint subset whose removal admits the target.
    pub async fn analyze(
        &self,
        model: &QueryModel,
        target: &TargetTuple,
    ) -> EngineResult<WhyNotExplanation> {
        let conjunct_count = model
            .predicate
            .as_ref()
            .map(|p| p.leaf_count())
            .unwrap_or(0);
        let edge_count = model.join_edges.len();
        let candidate_count = conjunct_count + edge_count;

        if candidate_count == 0 {
            return Err(EngineError::invalid(
                "query has no conjuncts or join edges to relax",
            ));
        }
        if candidate_count > MAX_RELAXATION_CANDIDATES {
            return Err(EngineError::invalid(format!(
                "{} relaxation candidates exceed the supported maximum of {}",
                candidate_count, MAX_RELAXATION_CANDIDATES
            )));
        }

        let base_relation = resolve_target_relation(model, target)?;

        // Fast path: a tuple absent from its own base table cannot be
        // produced by any relaxation.
        let base = run(
            self.db,
            self.synth.base_row(base_relation, &target.key_predicate),
        )
        .await?;
        if base.is_empty() {
            return Err(EngineError::TupleUnreachable {
                target: target.key_predicate.clone(),
                detail: format!("no row in table '{}' matches it", base_relation.table),
            });
        }
        let base_row: HashMap<String, String> = base
            .columns
            .iter()
            .zip(base.rows[0].iter())
            .map(|(column, value)| (column.to_lowercase(), value.to_string()))
            .collect();

        // Candidate order: conjuncts in leaf order, then edges in model order
        let descriptions: Vec<String> = model
            .conjuncts()
            .iter()
            .map(|c| c.sql.clone())
            .chain(model.join_edges.iter().map(|e| e.condition_sql()))
            .collect();

        let mut steps: Vec<SearchStep> = Vec::new();
        let mut tested = 0;

        for size in 0..=candidate_count {
            for subset in combinations(candidate_count, size) {
                let removed_conjuncts: BTreeSet<usize> = subset
                    .iter()
                    .copied()
                    .filter(|&i| i < conjunct_count)
                    .collect();
                let removed_edges: BTreeSet<usize> = subset
                    .iter()
                    .copied()
                    .filter(|&i| i >= conjunct_count)
                    .map(|i| i - conjunct_count)
                    .collect();

                let query = self.synth.relaxed_membership(
                    model,
                    &target.key_predicate,
                    &removed_conjuncts,
                    &removed_edges,
                )?;
                let rows = run(self.db, query).await?;
                let matching = rows.scalar().and_then(Value::as_i64).unwrap_or(0);

                tested += 1;
                let removed_descriptions: Vec<String> =
                    subset.iter().map(|&i| descriptions[i].clone()).collect();
                steps.push(SearchStep {
                    removed: removed_descriptions.clone(),
                    matching_rows: matching,
                });

                if matching > 0 {
                    let repair_hints =
                        build_repair_hints(model, &removed_conjuncts, &removed_edges, &base_row);
                    return Ok(WhyNotExplanation {
                        target: target.key_predicate.clone(),
                        removed_conjuncts,
                        removed_join_edges: removed_edges,
                        removed_descriptions,
                        is_minimal: true,
                        tested_subsets: tested,
                        steps,
                        repair_hints,
                    });
                }
            }
        }

        Err(EngineError::TupleUnreachable {
            target: target.key_predicate.clone(),
            detail: format!(
                "no relaxation of up to {} constraints admits it",
                candidate_count
            ),
        })
    }
}

/// Match the target's table name or alias against the query's relations.
fn resolve_target_relation<'m>(
    model: &'m QueryModel,
    target: &TargetTuple,
) -> EngineResult<&'m Relation> {
    model
        .relations
        .iter()
        .find(|r| {
            r.alias.eq_ignore_ascii_case(&target.table) || r.table.eq_ignore_ascii_case(&target.table)
        })
        .ok_or_else(|| {
            EngineError::invalid(format!("query does not reference table '{}'", target.table))
        })
}

/// All `size`-element subsets of `0..count`, in lexicographic order.
fn combinations(count: usize, size: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(size);
    fill_combinations(0, count, size, &mut current, &mut out);
    out
}

fn fill_combinations(
    start: usize,
    count: usize,
    size: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    for index in start..count {
        current.push(index);
        fill_combinations(index + 1, count, size, current, out);
        current.pop();
    }
}

/// Concrete repair suggestions for the removed constraints, derived from
/// the target's base-table row.
fn build_repair_hints(
    model: &QueryModel,
    removed_conjuncts: &BTreeSet<usize>,
    removed_edges: &BTreeSet<usize>,
    base_row: &HashMap<String, String>,
) -> Vec<String> {
    let conjuncts = model.conjuncts();
    let mut hints = Vec::new();

    for &index in removed_conjuncts {
        let Some(conjunct) = conjuncts.get(index) else {
            continue;
        };
        let hint = match (&conjunct.column, &conjunct.operator, &conjunct.literal) {
            (Some(column), Some(operator), Some(literal)) => {
                match base_row.get(&column.to_lowercase()) {
                    Some(actual) => format!(
                        "`{}` is {} for this tuple but the predicate requires {} {}; \
                         adjust the threshold toward {} or change the row",
                        column, actual, operator, literal, actual
                    ),
                    None => format!(
                        "relax predicate `{}` so it holds for the target tuple",
                        conjunct.sql
                    ),
                }
            }
            _ => format!(
                "relax predicate `{}` so it holds for the target tuple",
                conjunct.sql
            ),
        };
        hints.push(hint);
    }

    for &index in removed_edges {
        let Some(edge) = model.join_edges.get(index) else {
            continue;
        };
        let other = model
            .relation(&edge.right_alias)
            .map(|r| r.table.as_str())
            .unwrap_or(edge.right_alias.as_str());
        hints.push(format!(
            "no row satisfies `{}` for this tuple; insert or fix a matching row in `{}`",
            edge.condition_sql(),
            other
        ));
    }

    hints
}

#[cfg(test)]
#[path = "why_not_test.rs"]
mod tests;
