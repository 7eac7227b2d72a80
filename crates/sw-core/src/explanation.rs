//! Result records produced by the analyzers and consumed by the formatter.
//!
//! All records are produced fresh per analysis invocation and live only for
//! the duration of one CLI run. Orderings are total (value first, key
//! string second) so repeated runs against an unchanged database render
//! byte-identical output.

use crate::model::AggregateFunction;
use serde::Serialize;
use std::collections::BTreeSet;

/// One group's (or tuple's) share of a SUM/COUNT aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionRecord {
    /// Rendered key column values identifying the group.
    pub key: Vec<String>,
    pub contribution: f64,
    /// Share of the aggregate total; `None` when the total is zero.
    pub percentage: Option<f64>,
    /// Member of the greedy explaining prefix for the expectation gap.
    pub explains_gap: bool,
}

impl ContributionRecord {
    pub fn key_display(&self) -> String {
        self.key.join(", ")
    }
}

/// One group's influence on an AVG aggregate.
///
/// AVG contributions are not additive, so groups carry their (sum, count)
/// pair and are ranked by `|group_avg - overall_avg| * group_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvgContributionRecord {
    pub key: Vec<String>,
    pub group_sum: f64,
    pub group_count: i64,
    pub group_avg: f64,
    pub influence: f64,
}

impl AvgContributionRecord {
    pub fn key_display(&self) -> String {
        self.key.join(", ")
    }
}

/// Aggregate analysis outcome.
#[derive(Debug, Clone, Serialize)]
pub enum AggregateReport {
    /// SUM/COUNT: contributions are additive and sum to `actual`.
    Additive {
        function: AggregateFunction,
        actual: f64,
        expected: f64,
        gap: f64,
        records: Vec<ContributionRecord>,
    },
    /// AVG: groups ranked by influence on the overall average.
    Average {
        overall_avg: f64,
        expected: f64,
        gap: f64,
        records: Vec<AvgContributionRecord>,
    },
}

/// Classification of a join key's population on the two sides of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchStatus {
    /// Key occurs on the right side only.
    MissingOnLeft,
    /// Key occurs on the left side only.
    MissingOnRight,
    /// Key occurs on both sides and its row product exceeds the fan-out
    /// threshold.
    FanOut,
    /// Key occurs on both sides below the threshold.
    Matched,
}

impl MismatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MismatchStatus::MissingOnLeft => "missing_on_left",
            MismatchStatus::MissingOnRight => "missing_on_right",
            MismatchStatus::FanOut => "fan_out",
            MismatchStatus::Matched => "matched",
        }
    }
}

/// Per-key population of one join edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinMismatchRecord {
    pub key: String,
    pub left_count: i64,
    pub right_count: i64,
    pub status: MismatchStatus,
}

impl JoinMismatchRecord {
    /// Predicted contribution to output cardinality under an inner join.
    pub fn product(&self) -> i64 {
        self.left_count * self.right_count
    }
}

/// Analysis of a single join edge.
#[derive(Debug, Clone, Serialize)]
pub struct JoinEdgeReport {
    pub edge_index: usize,
    pub condition: String,
    /// `table.column` labels for the two sides.
    pub left_label: String,
    pub right_label: String,
    /// Sum of per-key products: predicted inner-join output rows.
    pub predicted_rows: i64,
    pub records: Vec<JoinMismatchRecord>,
}

/// Join analysis outcome across all edges, in Query Model edge order.
#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub edges: Vec<JoinEdgeReport>,
    /// Actual row count of the original FROM/WHERE, when an expectation
    /// was given.
    pub actual_count: Option<i64>,
    pub expected_count: Option<i64>,
    pub gap: Option<i64>,
}

/// Per-tuple attribution of the WHERE clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateVerdict {
    pub key: Vec<String>,
    /// Pass/fail per conjunct, aligned with predicate-tree leaf order.
    pub conjuncts: Vec<bool>,
    /// Boolean evaluation of the predicate tree over the leaf verdicts.
    pub overall: bool,
    /// Observed membership in the full-predicate result set.
    pub included: bool,
}

impl PredicateVerdict {
    pub fn key_display(&self) -> String {
        self.key.join(", ")
    }
}

/// Predicate analysis outcome, verdicts ordered by key.
#[derive(Debug, Clone, Serialize)]
pub struct PredicateReport {
    pub conjunct_sql: Vec<String>,
    pub verdicts: Vec<PredicateVerdict>,
}

/// One tested relaxation during the why-not search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStep {
    /// Rendered constraints removed in this step.
    pub removed: Vec<String>,
    /// Rows matching the target under the relaxation.
    pub matching_rows: i64,
}

/// Minimal relaxation admitting a missing tuple.
#[derive(Debug, Clone, Serialize)]
pub struct WhyNotExplanation {
    /// The target tuple's key predicate, as given.
    pub target: String,
    pub removed_conjuncts: BTreeSet<usize>,
    pub removed_join_edges: BTreeSet<usize>,
    /// Rendered form of the removed constraints, in candidate order.
    pub removed_descriptions: Vec<String>,
    /// True when found by the size-ordered search (smallest subset seen).
    pub is_minimal: bool,
    pub tested_subsets: usize,
    /// Every tested relaxation, in search order.
    pub steps: Vec<SearchStep>,
    /// Concrete suggestions derived from the target's base row.
    pub repair_hints: Vec<String>,
}

impl WhyNotExplanation {
    /// The tuple was already present; nothing had to be relaxed.
    pub fn is_empty(&self) -> bool {
        self.removed_conjuncts.is_empty() && self.removed_join_edges.is_empty()
    }
}
