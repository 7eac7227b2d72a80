//! Join mismatch and fan-out analysis
//!
//! For every join edge the analyzer counts key populations on each side
//! independently, before the join multiplies rows. Keys missing from one
//! side explain lost rows; keys whose row product dwarfs the rest explain
//! inflated cardinality.

use crate::error::{EngineError, EngineResult};
use crate::synth::{run, QuerySynthesizer};
use std::collections::BTreeMap;
use sw_core::{
    JoinEdgeReport, JoinMismatchRecord, JoinReport, MismatchStatus, QueryModel, RowSet, Value,
};
use sw_db::ExecutionAdapter;

/// A matched key is flagged as fan-out when its row product exceeds this
/// multiple of the median product. Default chosen for calibration, not
/// reverse-engineered from usage.
pub const FAN_OUT_MULTIPLIER: f64 = 10.0;

pub struct JoinAnalyzer<'a> {
    db: &'a dyn ExecutionAdapter,
    synth: QuerySynthesizer,
}

impl<'a> JoinAnalyzer<'a> {
    pub fn new(db: &'a dyn ExecutionAdapter) -> Self {
        Self {
            db,
            synth: QuerySynthesizer::new(),
        }
    }

    /// Analyze every join edge in Query Model order. With an expected
    /// count, also report the actual FROM/WHERE cardinality and the gap.
    pub async fn analyze(
        &self,
        model: &QueryModel,
        expected_count: Option<i64>,
    ) -> EngineResult<JoinReport> {
        if model.join_edges.is_empty() {
            return Err(EngineError::invalid(
                "query has no join edges to analyze",
            ));
        }

        let mut edges = Vec::with_capacity(model.join_edges.len());
        for (edge_index, edge) in model.join_edges.iter().enumerate() {
            let (left_query, right_query) = self.synth.join_side_counts(model, edge_index)?;
            let left = side_counts(run(self.db, left_query).await?);
            let right = side_counts(run(self.db, right_query).await?);

            let left_relation = model.relation(&edge.left_alias).ok_or_else(|| {
                EngineError::unsupported(format!(
                    "join condition references unknown alias '{}'",
                    edge.left_alias
                ))
            })?;
            let right_relation = model.relation(&edge.right_alias).ok_or_else(|| {
                EngineError::unsupported(format!(
                    "join condition references unknown alias '{}'",
                    edge.right_alias
                ))
            })?;

            edges.push(edge_report(
                edge_index,
                edge.condition_sql(),
                format!("{}.{}", left_relation.table, edge.left_column),
                format!("{}.{}", right_relation.table, edge.right_column),
                left,
                right,
            ));
        }

        let (actual_count, gap) = match expected_count {
            Some(expected) => {
                let rows = run(self.db, self.synth.row_count(model)?).await?;
                let actual = rows.scalar().and_then(Value::as_i64).unwrap_or(0);
                (Some(actual), Some(actual - expected))
            }
            None => (None, None),
        };

        Ok(JoinReport {
            edges,
            actual_count,
            expected_count,
            gap,
        })
    }
}

/// Per-key counts for one side. NULL keys are kept apart: they never
/// match anything in an equi-join.
struct SideCounts {
    keys: BTreeMap<String, i64>,
    null_count: i64,
}

fn side_counts(rows: RowSet) -> SideCounts {
    let mut keys = BTreeMap::new();
    let mut null_count = 0;
    for row in &rows.rows {
        let count = row.get(1).and_then(Value::as_i64).unwrap_or(0);
        match row.first() {
            Some(Value::Null) | None => null_count += count,
            Some(value) => {
                keys.insert(value.to_string(), count);
            }
        }
    }
    SideCounts { keys, null_count }
}

fn edge_report(
    edge_index: usize,
    condition: String,
    left_label: String,
    right_label: String,
    left: SideCounts,
    right: SideCounts,
) -> JoinEdgeReport {
    let mut records = Vec::new();
    let mut products = Vec::new();

    for (key, left_count) in &left.keys {
        match right.keys.get(key) {
            Some(right_count) => {
                products.push(left_count * right_count);
                records.push(JoinMismatchRecord {
                    key: key.clone(),
                    left_count: *left_count,
                    right_count: *right_count,
                    status: MismatchStatus::Matched,
                });
            }
            None => records.push(JoinMismatchRecord {
                key: key.clone(),
                left_count: *left_count,
                right_count: 0,
                status: MismatchStatus::MissingOnRight,
            }),
        }
    }
    for (key, right_count) in &right.keys {
        if !left.keys.contains_key(key) {
            records.push(JoinMismatchRecord {
                key: key.clone(),
                left_count: 0,
                right_count: *right_count,
                status: MismatchStatus::MissingOnLeft,
            });
        }
    }
    if left.null_count > 0 {
        records.push(JoinMismatchRecord {
            key: "NULL".to_string(),
            left_count: left.null_count,
            right_count: 0,
            status: MismatchStatus::MissingOnRight,
        });
    }
    if right.null_count > 0 {
        records.push(JoinMismatchRecord {
            key: "NULL".to_string(),
            left_count: 0,
            right_count: right.null_count,
            status: MismatchStatus::MissingOnLeft,
        });
    }

    let threshold = FAN_OUT_MULTIPLIER * median(&products);
    for record in &mut records {
        if record.status == MismatchStatus::Matched && (record.product() as f64) > threshold {
            record.status = MismatchStatus::FanOut;
        }
    }

    // Ranked by predicted contribution to output cardinality
    records.sort_by(|a, b| b.product().cmp(&a.product()).then_with(|| a.key.cmp(&b.key)));

    JoinEdgeReport {
        edge_index,
        condition,
        left_label,
        right_label,
        predicted_rows: products.iter().sum(),
        records,
    }
}

fn median(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    }
}

#[cfg(test)]
#[path = "join_test.rs"]
mod tests;
