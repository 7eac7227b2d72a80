//! Diagnostic query synthesis
//!
//! Pure rewriting from the Query Model into executable diagnostic SQL.
//! Nothing in this module touches the database; every analyzer runs the
//! synthesized queries through [`run`], which consumes each
//! [`DiagnosticQuery`] exactly once.
//!
//! Two casts make downstream row handling type-safe by construction:
//! key/group columns are projected as VARCHAR and aggregate values as
//! DOUBLE, so adapters never need to understand backend-specific numerics.

use crate::error::{EngineError, EngineResult};
use std::collections::BTreeSet;
use std::fmt;
use sw_core::{AggregateFunction, QueryModel, Relation, RowSet};
use sw_db::ExecutionAdapter;

/// Why a diagnostic query was synthesized; used for logging and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Original,
    AggregateTotal,
    AggregateBreakdown,
    JoinSideCount,
    RowCount,
    PredicateUniverse,
    SingleConjunct,
    FullPredicate,
    RelaxedMembership,
    BaseRow,
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Purpose::Original => "original",
            Purpose::AggregateTotal => "aggregate-total",
            Purpose::AggregateBreakdown => "aggregate-breakdown",
            Purpose::JoinSideCount => "join-side-count",
            Purpose::RowCount => "row-count",
            Purpose::PredicateUniverse => "predicate-universe",
            Purpose::SingleConjunct => "single-conjunct",
            Purpose::FullPredicate => "full-predicate",
            Purpose::RelaxedMembership => "relaxed-membership",
            Purpose::BaseRow => "base-row",
        };
        write!(f, "{}", name)
    }
}

/// An immutable synthesized query, tagged with its purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticQuery {
    sql: String,
    purpose: Purpose,
}

impl DiagnosticQuery {
    fn new(sql: String, purpose: Purpose) -> Self {
        Self { sql, purpose }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }
}

/// Execute a diagnostic query, consuming it.
pub async fn run(db: &dyn ExecutionAdapter, query: DiagnosticQuery) -> EngineResult<RowSet> {
    log::debug!("{} query: {}", query.purpose(), query.sql());
    Ok(db.query(query.sql()).await?)
}

/// Pure Query Model -> SQL transformer shared by all analyzers.
#[derive(Debug, Default)]
pub struct QuerySynthesizer;

impl QuerySynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild the FROM chain, skipping the join edges in `removed_edges`
    /// (by Query Model edge index). A join clause that loses all its edges
    /// degrades to `ON TRUE`.
    fn from_clause(&self, model: &QueryModel, removed_edges: &BTreeSet<usize>) -> EngineResult<String> {
        let first = model
            .relations
            .first()
            .ok_or_else(|| EngineError::unsupported("query without FROM"))?;

        let mut sql = format!("FROM {}", first.to_sql());
        let mut introduced = vec![first.alias.as_str()];

        for relation in &model.relations[1..] {
            let clause_edges: Vec<(usize, &sw_core::JoinEdge)> = model
                .join_edges
                .iter()
                .enumerate()
                .filter(|(_, edge)| {
                    (edge.left_alias == relation.alias
                        && introduced.contains(&edge.right_alias.as_str()))
                        || (edge.right_alias == relation.alias
                            && introduced.contains(&edge.left_alias.as_str()))
                })
                .collect();

            if clause_edges.is_empty() {
                return Err(EngineError::unsupported(format!(
                    "relation '{}' has no join edge to the preceding relations",
                    relation.alias
                )));
            }

            let kind = clause_edges[0].1.kind;
            let kept: Vec<String> = clause_edges
                .iter()
                .filter(|(index, _)| !removed_edges.contains(index))
                .map(|(_, edge)| edge.condition_sql())
                .collect();
            let on = if kept.is_empty() {
                "TRUE".to_string()
            } else {
                kept.join(" AND ")
            };

            sql.push_str(&format!(" {} {} ON {}", kind.as_sql(), relation.to_sql(), on));
            introduced.push(relation.alias.as_str());
        }

        Ok(sql)
    }

    /// FROM + WHERE with the full predicate, shared by most rewrites.
    fn from_where(&self, model: &QueryModel) -> EngineResult<String> {
        let mut sql = self.from_clause(model, &BTreeSet::new())?;
        if let Some(predicate) = &model.predicate {
            sql.push_str(&format!(" WHERE {}", predicate.to_sql()));
        }
        Ok(sql)
    }

    fn key_projection(key_exprs: &[String]) -> String {
        key_exprs
            .iter()
            .enumerate()
            .map(|(i, expr)| format!("CAST({} AS VARCHAR) AS key_{}", expr, i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Regenerate a query semantically equivalent to the original.
    pub fn original_query(&self, model: &QueryModel) -> EngineResult<DiagnosticQuery> {
        let mut sql = format!("SELECT {} {}", model.projection.join(", "), self.from_where(model)?);
        if let Some(agg) = &model.aggregate {
            if !agg.group_by.is_empty() {
                sql.push_str(&format!(" GROUP BY {}", agg.group_by.join(", ")));
            }
        }
        Ok(DiagnosticQuery::new(sql, Purpose::Original))
    }

    /// Ungrouped aggregate over the original FROM/WHERE: the actual value
    /// the analyst's expectation is compared against.
    pub fn aggregate_total(&self, model: &QueryModel) -> EngineResult<DiagnosticQuery> {
        let agg = model.aggregate.as_ref().ok_or_else(|| {
            EngineError::invalid("aggregate analysis requires a SUM/COUNT/AVG query")
        })?;
        let sql = format!(
            "SELECT CAST({} AS DOUBLE) AS total {}",
            agg.call_sql(),
            self.from_where(model)?
        );
        Ok(DiagnosticQuery::new(sql, Purpose::AggregateTotal))
    }

    /// Per-group contribution breakdown for SUM/COUNT. Joins and predicates
    /// are carried over untouched; only the projection changes.
    pub fn aggregate_breakdown(
        &self,
        model: &QueryModel,
        key_exprs: &[String],
    ) -> EngineResult<DiagnosticQuery> {
        let agg = model.aggregate.as_ref().ok_or_else(|| {
            EngineError::invalid("aggregate analysis requires a SUM/COUNT/AVG query")
        })?;
        let contribution = match agg.function {
            AggregateFunction::Sum | AggregateFunction::Count => {
                format!("CAST({} AS DOUBLE)", agg.call_sql())
            }
            AggregateFunction::Avg => {
                return Err(EngineError::invalid(
                    "AVG breakdown uses avg_breakdown (sum/count pairs)",
                ))
            }
        };
        let sql = format!(
            "SELECT {}, {} AS contribution {} GROUP BY {} ORDER BY contribution DESC, {}",
            Self::key_projection(key_exprs),
            contribution,
            self.from_where(model)?,
            key_exprs.join(", "),
            key_exprs.join(", "),
        );
        Ok(DiagnosticQuery::new(sql, Purpose::AggregateBreakdown))
    }

    /// Per-group (sum, count) pairs for AVG influence ranking.
    pub fn avg_breakdown(
        &self,
        model: &QueryModel,
        key_exprs: &[String],
    ) -> EngineResult<DiagnosticQuery> {
        let agg = model.aggregate.as_ref().ok_or_else(|| {
            EngineError::invalid("aggregate analysis requires a SUM/COUNT/AVG query")
        })?;
        let sql = format!(
            "SELECT {}, CAST(SUM({expr}) AS DOUBLE) AS group_sum, COUNT({expr}) AS group_count {} GROUP BY {} ORDER BY {}",
            Self::key_projection(key_exprs),
            self.from_where(model)?,
            key_exprs.join(", "),
            key_exprs.join(", "),
            expr = agg.expression,
        );
        Ok(DiagnosticQuery::new(sql, Purpose::AggregateBreakdown))
    }

    /// Per-key population of one side of a join edge, deliberately
    /// independent of the other relation and of the WHERE clause.
    pub fn join_side_counts(
        &self,
        model: &QueryModel,
        edge_index: usize,
    ) -> EngineResult<(DiagnosticQuery, DiagnosticQuery)> {
        let edge = model
            .join_edges
            .get(edge_index)
            .ok_or_else(|| EngineError::invalid(format!("join edge index {} out of range", edge_index)))?;

        let left = self.side_count(model, &edge.left_alias, &edge.left_column)?;
        let right = self.side_count(model, &edge.right_alias, &edge.right_column)?;
        Ok((left, right))
    }

    fn side_count(
        &self,
        model: &QueryModel,
        alias: &str,
        column: &str,
    ) -> EngineResult<DiagnosticQuery> {
        let relation = model.relation(alias).ok_or_else(|| {
            EngineError::unsupported(format!("join condition references unknown alias '{}'", alias))
        })?;
        let sql = format!(
            "SELECT CAST({alias}.{column} AS VARCHAR) AS join_key, COUNT(*) AS key_count \
             FROM {table} AS {alias} GROUP BY {alias}.{column}",
            alias = alias,
            column = column,
            table = relation.table,
        );
        Ok(DiagnosticQuery::new(sql, Purpose::JoinSideCount))
    }

    /// Row count of the original FROM/WHERE.
    pub fn row_count(&self, model: &QueryModel) -> EngineResult<DiagnosticQuery> {
        let sql = format!("SELECT COUNT(*) AS n {}", self.from_where(model)?);
        Ok(DiagnosticQuery::new(sql, Purpose::RowCount))
    }

    /// Distinct tuple keys over the full FROM/JOIN with no predicate.
    pub fn predicate_universe(
        &self,
        model: &QueryModel,
        key_exprs: &[String],
    ) -> EngineResult<DiagnosticQuery> {
        let sql = format!(
            "SELECT DISTINCT {} {}",
            Self::key_projection(key_exprs),
            self.from_clause(model, &BTreeSet::new())?
        );
        Ok(DiagnosticQuery::new(sql, Purpose::PredicateUniverse))
    }

    /// Tuple keys passing exactly one conjunct, all others removed.
    pub fn single_conjunct(
        &self,
        model: &QueryModel,
        key_exprs: &[String],
        conjunct_index: usize,
    ) -> EngineResult<DiagnosticQuery> {
        let conjuncts = model.conjuncts();
        let conjunct = conjuncts.get(conjunct_index).ok_or_else(|| {
            EngineError::invalid(format!("conjunct index {} out of range", conjunct_index))
        })?;
        let sql = format!(
            "SELECT DISTINCT {} {} WHERE {}",
            Self::key_projection(key_exprs),
            self.from_clause(model, &BTreeSet::new())?,
            conjunct.sql,
        );
        Ok(DiagnosticQuery::new(sql, Purpose::SingleConjunct))
    }

    /// Tuple keys passing the whole predicate tree.
    pub fn full_predicate(
        &self,
        model: &QueryModel,
        key_exprs: &[String],
    ) -> EngineResult<DiagnosticQuery> {
        let predicate = model
            .predicate
            .as_ref()
            .ok_or_else(|| EngineError::invalid("query has no WHERE predicates to analyze"))?;
        let sql = format!(
            "SELECT DISTINCT {} {} WHERE {}",
            Self::key_projection(key_exprs),
            self.from_clause(model, &BTreeSet::new())?,
            predicate.to_sql(),
        );
        Ok(DiagnosticQuery::new(sql, Purpose::FullPredicate))
    }

    /// Count rows matching the target under a relaxation: the given
    /// conjuncts and join edges are dropped, everything else stays.
    pub fn relaxed_membership(
        &self,
        model: &QueryModel,
        key_predicate: &str,
        removed_conjuncts: &BTreeSet<usize>,
        removed_edges: &BTreeSet<usize>,
    ) -> EngineResult<DiagnosticQuery> {
        let from = self.from_clause(model, removed_edges)?;
        let remaining = model
            .predicate
            .as_ref()
            .and_then(|p| p.without_leaves(removed_conjuncts));
        let condition = match remaining {
            Some(node) => format!("({}) AND ({})", node.to_sql(), key_predicate),
            None => format!("({})", key_predicate),
        };
        let sql = format!("SELECT COUNT(*) AS n {} WHERE {}", from, condition);
        Ok(DiagnosticQuery::new(sql, Purpose::RelaxedMembership))
    }

    /// The target's row in its base table, bypassing the rest of the query.
    pub fn base_row(&self, relation: &Relation, key_predicate: &str) -> DiagnosticQuery {
        let sql = format!(
            "SELECT * FROM {} AS {} WHERE {}",
            relation.table, relation.alias, key_predicate
        );
        DiagnosticQuery::new(sql, Purpose::BaseRow)
    }
}

#[cfg(test)]
#[path = "synth_test.rs"]
mod tests;
