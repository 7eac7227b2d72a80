//! Aggregate contribution analysis
//!
//! Ranks per-group contributions to a SUM/COUNT/AVG whose actual value
//! surprised the analyst, and greedily marks the smallest prefix of the
//! ranking that accounts for the expectation gap. The greedy prefix is a
//! heuristic "smallest explaining set", not a global minimum.

use crate::error::{EngineError, EngineResult};
use crate::synth::{run, QuerySynthesizer};
use sw_core::{
    AggregateFunction, AggregateReport, AvgContributionRecord, ContributionRecord, QueryModel,
    RowSet, Value,
};
use sw_db::ExecutionAdapter;

pub struct AggregateAnalyzer<'a> {
    db: &'a dyn ExecutionAdapter,
    synth: QuerySynthesizer,
}

impl<'a> AggregateAnalyzer<'a> {
    pub fn new(db: &'a dyn ExecutionAdapter) -> Self {
        Self {
            db,
            synth: QuerySynthesizer::new(),
        }
    }

    /// Compare the aggregate's actual value against `expected` and rank
    /// group contributions. Grouped queries attribute per GROUP BY key;
    /// ungrouped queries need explicit `key_columns` to identify tuples.
    pub async fn analyze(
        &self,
        model: &QueryModel,
        expected: f64,
        key_columns: &[String],
    ) -> EngineResult<AggregateReport> {
        let agg = model.aggregate.as_ref().ok_or_else(|| {
            EngineError::invalid("aggregate analysis requires a SUM/COUNT/AVG query")
        })?;

        let key_exprs: Vec<String> = if !agg.group_by.is_empty() {
            agg.group_by.clone()
        } else if !key_columns.is_empty() {
            key_columns.to_vec()
        } else {
            return Err(EngineError::invalid(
                "ungrouped aggregate needs key columns to attribute contributions",
            ));
        };

        let total = run(self.db, self.synth.aggregate_total(model)?).await?;
        // SUM over zero rows is NULL; treat it as zero for gap arithmetic
        let actual = total.scalar().and_then(Value::as_f64).unwrap_or(0.0);
        let gap = actual - expected;

        match agg.function {
            AggregateFunction::Sum | AggregateFunction::Count => {
                let rows = run(self.db, self.synth.aggregate_breakdown(model, &key_exprs)?).await?;
                let mut records = additive_records(&rows, key_exprs.len(), actual);
                sort_contributions(&mut records);
                mark_explaining_prefix(&mut records, gap);
                Ok(AggregateReport::Additive {
                    function: agg.function,
                    actual,
                    expected,
                    gap,
                    records,
                })
            }
            AggregateFunction::Avg => {
                let rows = run(self.db, self.synth.avg_breakdown(model, &key_exprs)?).await?;
                let mut records = average_records(&rows, key_exprs.len(), actual);
                records.sort_by(|a, b| {
                    b.influence
                        .total_cmp(&a.influence)
                        .then_with(|| a.key.cmp(&b.key))
                });
                Ok(AggregateReport::Average {
                    overall_avg: actual,
                    expected,
                    gap,
                    records,
                })
            }
        }
    }
}

fn additive_records(rows: &RowSet, key_len: usize, actual: f64) -> Vec<ContributionRecord> {
    rows.rows
        .iter()
        .map(|row| {
            let key: Vec<String> = row[..key_len].iter().map(Value::to_string).collect();
            let contribution = row[key_len].as_f64().unwrap_or(0.0);
            let percentage = if actual == 0.0 {
                None
            } else {
                Some(contribution / actual)
            };
            ContributionRecord {
                key,
                contribution,
                percentage,
                explains_gap: false,
            }
        })
        .collect()
}

fn average_records(rows: &RowSet, key_len: usize, overall_avg: f64) -> Vec<AvgContributionRecord> {
    rows.rows
        .iter()
        .map(|row| {
            let key: Vec<String> = row[..key_len].iter().map(Value::to_string).collect();
            let group_sum = row[key_len].as_f64().unwrap_or(0.0);
            let group_count = row[key_len + 1].as_i64().unwrap_or(0);
            let group_avg = if group_count > 0 {
                group_sum / group_count as f64
            } else {
                0.0
            };
            // Influence on the overall average is weighted by group size
            let influence = (group_avg - overall_avg).abs() * group_count as f64;
            AvgContributionRecord {
                key,
                group_sum,
                group_count,
                group_avg,
                influence,
            }
        })
        .collect()
}

/// Descending by contribution, ties broken by key ascending for
/// deterministic output.
fn sort_contributions(records: &mut [ContributionRecord]) {
    records.sort_by(|a, b| {
        b.contribution
            .total_cmp(&a.contribution)
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Greedily flag the prefix of the ranking that moves the actual value
/// across the expectation. A positive gap consumes the largest
/// contributions; a negative gap consumes the most negative ones.
fn mark_explaining_prefix(records: &mut [ContributionRecord], gap: f64) {
    if gap == 0.0 {
        return;
    }
    let mut cumulative = 0.0;
    if gap > 0.0 {
        for record in records.iter_mut() {
            if record.contribution <= 0.0 {
                break;
            }
            record.explains_gap = true;
            cumulative += record.contribution;
            if cumulative >= gap {
                break;
            }
        }
    } else {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| {
            records[a]
                .contribution
                .total_cmp(&records[b].contribution)
                .then_with(|| records[a].key.cmp(&records[b].key))
        });
        for index in order {
            let record = &mut records[index];
            if record.contribution >= 0.0 {
                break;
            }
            record.explains_gap = true;
            cumulative += record.contribution;
            if cumulative <= gap {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
