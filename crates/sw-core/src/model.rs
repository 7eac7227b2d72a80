//! Semantic Query Model: relations, join edges, predicate tree, aggregate.
//!
//! The model is a lossless semantic representation of a supported query:
//! it regenerates an executable query with identical semantics, though not
//! necessarily identical text. Conjunct (leaf) order is depth-first and is
//! the index space used by predicate attribution and why-not relaxation.

use crate::error::{CoreError, CoreResult};
use petgraph::unionfind::UnionFind;
use serde::Serialize;
use std::collections::BTreeSet;

/// A base relation in FROM/JOIN order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub alias: String,
    pub table: String,
}

impl Relation {
    /// Render as a FROM-clause item. The alias is omitted when it is just
    /// the table name, since the table name then already qualifies columns.
    pub fn to_sql(&self) -> String {
        if self.alias == self.table {
            self.table.clone()
        } else {
            format!("{} AS {}", self.table, self.alias)
        }
    }
}

/// Join flavor of an edge. Equi-joins only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// One column-equality edge of the join graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinEdge {
    pub left_alias: String,
    pub left_column: String,
    pub right_alias: String,
    pub right_column: String,
    pub kind: JoinKind,
}

impl JoinEdge {
    pub fn condition_sql(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.left_alias, self.left_column, self.right_alias, self.right_column
        )
    }
}

/// Boolean connective of a predicate tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// An atomic boolean condition from the WHERE clause.
///
/// `sql` is the full rendered condition and is always present. The
/// structured parts are populated only for simple `column op literal`
/// comparisons; they feed why-not repair hints and are never required
/// for query regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conjunct {
    pub sql: String,
    pub relation: Option<String>,
    pub column: Option<String>,
    pub operator: Option<String>,
    pub literal: Option<String>,
}

impl Conjunct {
    /// A conjunct with no structured parts, just its SQL text.
    pub fn opaque(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            relation: None,
            column: None,
            operator: None,
            literal: None,
        }
    }
}

/// Predicate tree node: a conjunct leaf or an AND/OR connective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PredicateNode {
    Conjunct(Conjunct),
    Connective {
        op: BoolOp,
        children: Vec<PredicateNode>,
    },
}

impl PredicateNode {
    /// Leaves in depth-first order. Their positions are the conjunct
    /// indices used throughout attribution and relaxation.
    pub fn leaves(&self) -> Vec<&Conjunct> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Conjunct>) {
        match self {
            PredicateNode::Conjunct(c) => out.push(c),
            PredicateNode::Connective { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            PredicateNode::Conjunct(_) => 1,
            PredicateNode::Connective { children, .. } => {
                children.iter().map(PredicateNode::leaf_count).sum()
            }
        }
    }

    /// Reconstruct an equivalent boolean SQL expression. Nested
    /// connectives are parenthesized so precedence survives the round trip.
    pub fn to_sql(&self) -> String {
        match self {
            PredicateNode::Conjunct(c) => c.sql.clone(),
            PredicateNode::Connective { op, children } => children
                .iter()
                .map(|child| match child {
                    PredicateNode::Conjunct(c) => c.sql.clone(),
                    PredicateNode::Connective { .. } => format!("({})", child.to_sql()),
                })
                .collect::<Vec<_>>()
                .join(&format!(" {} ", op.as_sql())),
        }
    }

    /// Evaluate the tree over per-leaf verdicts, in leaf order.
    ///
    /// Every child is evaluated (no short-circuit) so the cursor stays
    /// aligned with the depth-first leaf indices.
    pub fn evaluate(&self, leaf_values: &[bool]) -> bool {
        let mut cursor = 0;
        self.evaluate_inner(leaf_values, &mut cursor)
    }

    fn evaluate_inner(&self, leaf_values: &[bool], cursor: &mut usize) -> bool {
        match self {
            PredicateNode::Conjunct(_) => {
                let value = leaf_values.get(*cursor).copied().unwrap_or(false);
                *cursor += 1;
                value
            }
            PredicateNode::Connective { op, children } => {
                let results: Vec<bool> = children
                    .iter()
                    .map(|child| child.evaluate_inner(leaf_values, cursor))
                    .collect();
                match op {
                    BoolOp::And => results.iter().all(|v| *v),
                    BoolOp::Or => results.iter().any(|v| *v),
                }
            }
        }
    }

    /// Drop the given leaves (by depth-first index), collapsing
    /// single-child connectives and removing empty ones. `None` means the
    /// whole predicate vanished, i.e. TRUE.
    pub fn without_leaves(&self, removed: &BTreeSet<usize>) -> Option<PredicateNode> {
        let mut cursor = 0;
        self.prune(removed, &mut cursor)
    }

    fn prune(&self, removed: &BTreeSet<usize>, cursor: &mut usize) -> Option<PredicateNode> {
        match self {
            PredicateNode::Conjunct(c) => {
                let index = *cursor;
                *cursor += 1;
                if removed.contains(&index) {
                    None
                } else {
                    Some(PredicateNode::Conjunct(c.clone()))
                }
            }
            PredicateNode::Connective { op, children } => {
                let mut kept: Vec<PredicateNode> = Vec::new();
                for child in children {
                    if let Some(node) = child.prune(removed, cursor) {
                        kept.push(node);
                    }
                }
                match kept.len() {
                    0 => None,
                    1 => kept.pop(),
                    _ => Some(PredicateNode::Connective {
                        op: *op,
                        children: kept,
                    }),
                }
            }
        }
    }
}

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
}

impl AggregateFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
        }
    }
}

/// The query's single aggregate expression, with its grouping keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    pub expression: String,
    pub group_by: Vec<String>,
}

impl AggregateExpr {
    pub fn call_sql(&self) -> String {
        format!("{}({})", self.function.as_sql(), self.expression)
    }
}

/// Structured, semantic representation of a parsed query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryModel {
    /// FROM/JOIN order, first entry is the FROM relation.
    pub relations: Vec<Relation>,
    pub join_edges: Vec<JoinEdge>,
    pub predicate: Option<PredicateNode>,
    pub aggregate: Option<AggregateExpr>,
    /// Rendered SELECT items, `["*"]` for a bare wildcard.
    pub projection: Vec<String>,
}

impl QueryModel {
    pub fn relation(&self, alias: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.alias == alias)
    }

    /// Conjunct leaves in attribution order (empty without a WHERE clause).
    pub fn conjuncts(&self) -> Vec<&Conjunct> {
        self.predicate
            .as_ref()
            .map(PredicateNode::leaves)
            .unwrap_or_default()
    }

    /// Structural validation: every edge endpoint must name a relation,
    /// aliases must be unique, and the join graph must be connected
    /// (a disconnected graph is an implicit cartesian product, which the
    /// diagnostic rewrites cannot reproduce faithfully).
    pub fn validate(&self) -> CoreResult<()> {
        for (i, rel) in self.relations.iter().enumerate() {
            if self.relations[..i].iter().any(|r| r.alias == rel.alias) {
                return Err(CoreError::UnsupportedShape {
                    construct: format!("duplicate relation alias '{}'", rel.alias),
                });
            }
        }

        let index_of = |alias: &str| self.relations.iter().position(|r| r.alias == alias);

        let mut components: UnionFind<usize> = UnionFind::new(self.relations.len());
        for edge in &self.join_edges {
            let left = index_of(&edge.left_alias).ok_or_else(|| CoreError::UnsupportedShape {
                construct: format!("join condition references unknown alias '{}'", edge.left_alias),
            })?;
            let right = index_of(&edge.right_alias).ok_or_else(|| CoreError::UnsupportedShape {
                construct: format!(
                    "join condition references unknown alias '{}'",
                    edge.right_alias
                ),
            })?;
            if left == right {
                return Err(CoreError::UnsupportedShape {
                    construct: format!(
                        "join condition within a single relation: {}",
                        edge.condition_sql()
                    ),
                });
            }
            components.union(left, right);
        }

        for i in 1..self.relations.len() {
            if !components.equiv(0, i) {
                return Err(CoreError::UnsupportedShape {
                    construct: format!(
                        "relation '{}' is not connected to the join graph",
                        self.relations[i].alias
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
