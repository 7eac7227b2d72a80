//! Query Model builder: lowers a parsed statement into [`QueryModel`]
//!
//! Only the supported grammar survives lowering: a single SELECT over one
//! FROM chain of equi-joins, a conjunctive WHERE tree (nested AND/OR), at
//! most one SUM/COUNT/AVG aggregate, and plain GROUP BY keys. Everything
//! else is rejected here with the offending construct named, so the
//! synthesizer downstream can assume a well-shaped model.

use crate::error::{SqlError, SqlResult};
use sqlparser::ast::{
    visit_expressions, BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr,
    FunctionArguments, GroupByExpr, Join, JoinConstraint, JoinOperator, SelectItem, SetExpr,
    Statement, TableFactor, UnaryOperator,
};
use std::ops::ControlFlow;
use sw_core::{
    AggregateExpr, AggregateFunction, BoolOp, Conjunct, JoinEdge, JoinKind, PredicateNode,
    QueryModel, Relation,
};

fn unsupported(construct: impl Into<String>) -> SqlError {
    SqlError::UnsupportedShape {
        construct: construct.into(),
    }
}

/// Build a [`QueryModel`] from a parsed statement.
pub fn build_query_model(statement: &Statement) -> SqlResult<QueryModel> {
    scan_unsupported_expressions(statement)?;

    let query = match statement {
        Statement::Query(query) => query,
        other => {
            let text = other.to_string();
            let kind = text.split_whitespace().next().unwrap_or("?").to_uppercase();
            return Err(unsupported(format!("{} statement", kind)));
        }
    };

    if query.with.is_some() {
        return Err(unsupported("WITH (common table expression)"));
    }
    if query.limit_clause.is_some() {
        return Err(unsupported("LIMIT/OFFSET"));
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select,
        _ => return Err(unsupported("set operation (UNION/INTERSECT/EXCEPT)")),
    };

    if select.distinct.is_some() {
        return Err(unsupported("SELECT DISTINCT"));
    }
    if select.having.is_some() {
        return Err(unsupported("HAVING"));
    }

    // FROM chain: one base relation plus JOIN clauses
    if select.from.is_empty() {
        return Err(unsupported("query without FROM"));
    }
    if select.from.len() > 1 {
        return Err(unsupported("comma-separated FROM (implicit cross join)"));
    }

    let base = &select.from[0];
    let mut relations = vec![relation_from_factor(&base.relation)?];
    let mut join_edges = Vec::new();
    for join in &base.joins {
        lower_join(join, &mut relations, &mut join_edges)?;
    }

    // Projection and the single aggregate
    let mut projection = Vec::new();
    let mut aggregate: Option<AggregateExpr> = None;
    for item in &select.projection {
        projection.push(item.to_string());
        if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
            if let Some(agg) = extract_aggregate(expr)? {
                if aggregate.is_some() {
                    return Err(unsupported("more than one aggregate expression"));
                }
                aggregate = Some(agg);
            }
        }
    }

    // GROUP BY keys attach to the aggregate
    let group_by = lower_group_by(&select.group_by)?;
    match aggregate.as_mut() {
        Some(agg) => agg.group_by = group_by,
        None if !group_by.is_empty() => {
            return Err(unsupported("GROUP BY without a supported aggregate"));
        }
        None => {}
    }

    let predicate = select.selection.as_ref().map(build_predicate_tree);

    let model = QueryModel {
        relations,
        join_edges,
        predicate,
        aggregate,
        projection,
    };
    model.validate()?;
    Ok(model)
}

/// Reject subqueries and window functions anywhere in the statement.
fn scan_unsupported_expressions(statement: &Statement) -> SqlResult<()> {
    let mut construct: Option<&'static str> = None;
    let _ = visit_expressions(statement, |expr: &Expr| {
        let found = match expr {
            Expr::Subquery(_) | Expr::InSubquery { .. } | Expr::Exists { .. } => Some("subquery"),
            Expr::Function(f) if f.over.is_some() => Some("window function"),
            _ => None,
        };
        if let Some(name) = found {
            construct = Some(name);
            return ControlFlow::Break(());
        }
        ControlFlow::<()>::Continue(())
    });
    match construct {
        Some(name) => Err(unsupported(name)),
        None => Ok(()),
    }
}

fn relation_from_factor(factor: &TableFactor) -> SqlResult<Relation> {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let table = name.to_string();
            let alias = match alias {
                Some(a) => a.name.value.clone(),
                // schema-qualified names alias as their last component
                None => table.rsplit('.').next().unwrap_or(&table).to_string(),
            };
            Ok(Relation { alias, table })
        }
        TableFactor::Derived { .. } => Err(unsupported("derived table (subquery in FROM)")),
        TableFactor::NestedJoin { .. } => Err(unsupported("parenthesized join")),
        other => Err(unsupported(format!("table factor '{}'", other))),
    }
}

fn lower_join(
    join: &Join,
    relations: &mut Vec<Relation>,
    join_edges: &mut Vec<JoinEdge>,
) -> SqlResult<()> {
    let relation = relation_from_factor(&join.relation)?;

    let (kind, constraint) = match &join.join_operator {
        JoinOperator::Join(constraint) | JoinOperator::Inner(constraint) => {
            (JoinKind::Inner, constraint)
        }
        JoinOperator::Left(constraint) | JoinOperator::LeftOuter(constraint) => {
            (JoinKind::Left, constraint)
        }
        JoinOperator::Right(constraint) | JoinOperator::RightOuter(constraint) => {
            (JoinKind::Right, constraint)
        }
        JoinOperator::FullOuter(_) => return Err(unsupported("FULL OUTER JOIN")),
        JoinOperator::CrossJoin(_) => return Err(unsupported("CROSS JOIN")),
        other => return Err(unsupported(format!("join operator {:?}", other))),
    };

    let on = match constraint {
        JoinConstraint::On(expr) => expr,
        JoinConstraint::Using(_) => return Err(unsupported("USING join constraint")),
        JoinConstraint::Natural => return Err(unsupported("NATURAL join")),
        JoinConstraint::None => return Err(unsupported("join without ON condition")),
    };

    relations.push(relation);
    edges_from_on(on, kind, join_edges)
}

/// Split an ON condition into equi-join edges. Anything that is not a
/// conjunction of qualified `column = column` comparisons is unsupported.
fn edges_from_on(on: &Expr, kind: JoinKind, join_edges: &mut Vec<JoinEdge>) -> SqlResult<()> {
    match on {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            edges_from_on(left, kind, join_edges)?;
            edges_from_on(right, kind, join_edges)
        }
        Expr::Nested(inner) => edges_from_on(inner, kind, join_edges),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            let (left_alias, left_column) = qualified_column(left)?;
            let (right_alias, right_column) = qualified_column(right)?;
            join_edges.push(JoinEdge {
                left_alias,
                left_column,
                right_alias,
                right_column,
                kind,
            });
            Ok(())
        }
        other => Err(unsupported(format!("non-equi join condition '{}'", other))),
    }
}

fn qualified_column(expr: &Expr) -> SqlResult<(String, String)> {
    match expr {
        Expr::CompoundIdentifier(idents) if idents.len() >= 2 => {
            let alias = idents[idents.len() - 2].value.clone();
            let column = idents[idents.len() - 1].value.clone();
            Ok((alias, column))
        }
        Expr::Identifier(ident) => Err(unsupported(format!(
            "unqualified join column '{}'",
            ident.value
        ))),
        other => Err(unsupported(format!("non-column join operand '{}'", other))),
    }
}

fn lower_group_by(group_by: &GroupByExpr) -> SqlResult<Vec<String>> {
    match group_by {
        GroupByExpr::Expressions(exprs, modifiers) => {
            if !modifiers.is_empty() {
                return Err(unsupported("GROUP BY modifier (ROLLUP/CUBE/GROUPING SETS)"));
            }
            Ok(exprs.iter().map(|e| e.to_string()).collect())
        }
        _ => Err(unsupported("GROUP BY ALL")),
    }
}

/// Extract the aggregate call from a projection item, if any.
///
/// The item must either contain no aggregate or *be* a bare SUM/COUNT/AVG
/// call; aggregates nested inside larger expressions are unsupported.
fn extract_aggregate(expr: &Expr) -> SqlResult<Option<AggregateExpr>> {
    let calls = aggregate_calls(expr);
    match calls.len() {
        0 => Ok(None),
        1 => match expr {
            Expr::Function(func) if is_aggregate_function(func) => {
                Ok(Some(aggregate_from_function(func)?))
            }
            _ => Err(unsupported(format!(
                "aggregate nested inside an expression '{}'",
                expr
            ))),
        },
        _ => Err(unsupported(format!(
            "multiple aggregates in one expression '{}'",
            expr
        ))),
    }
}

fn aggregate_calls(expr: &Expr) -> Vec<Function> {
    let mut calls = Vec::new();
    let _ = visit_expressions(expr, |e: &Expr| {
        if let Expr::Function(func) = e {
            if is_aggregate_function(func) {
                calls.push(func.clone());
            }
        }
        ControlFlow::<()>::Continue(())
    });
    calls
}

fn is_aggregate_function(func: &Function) -> bool {
    matches!(
        func.name.to_string().to_uppercase().as_str(),
        "SUM" | "COUNT" | "AVG"
    )
}

fn aggregate_from_function(func: &Function) -> SqlResult<AggregateExpr> {
    let name = func.name.to_string().to_uppercase();
    let function = match name.as_str() {
        "SUM" => AggregateFunction::Sum,
        "COUNT" => AggregateFunction::Count,
        "AVG" => AggregateFunction::Avg,
        other => return Err(unsupported(format!("aggregate function {}", other))),
    };

    let list = match &func.args {
        FunctionArguments::List(list) => list,
        _ => return Err(unsupported(format!("{} without an argument list", name))),
    };
    if list.duplicate_treatment.is_some() {
        return Err(unsupported(format!("DISTINCT inside {}()", name)));
    }
    if list.args.len() != 1 {
        return Err(unsupported(format!(
            "{} with {} arguments",
            name,
            list.args.len()
        )));
    }

    let expression = match &list.args[0] {
        FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => e.to_string(),
        FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => {
            if matches!(function, AggregateFunction::Count) {
                "*".to_string()
            } else {
                return Err(unsupported(format!("{}(*)", name)));
            }
        }
        other => return Err(unsupported(format!("aggregate argument '{}'", other))),
    };

    Ok(AggregateExpr {
        function,
        expression,
        group_by: Vec::new(),
    })
}

/// Lower a WHERE expression into the predicate tree, flattening runs of
/// the same connective so `a AND b AND c` becomes one three-child node.
fn build_predicate_tree(expr: &Expr) -> PredicateNode {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::And,
            ..
        } => {
            let mut children = Vec::new();
            flatten_connective(expr, BoolOp::And, &mut children);
            PredicateNode::Connective {
                op: BoolOp::And,
                children,
            }
        }
        Expr::BinaryOp {
            op: BinaryOperator::Or,
            ..
        } => {
            let mut children = Vec::new();
            flatten_connective(expr, BoolOp::Or, &mut children);
            PredicateNode::Connective {
                op: BoolOp::Or,
                children,
            }
        }
        Expr::Nested(inner) => build_predicate_tree(inner),
        other => PredicateNode::Conjunct(conjunct_from_expr(other)),
    }
}

fn flatten_connective(expr: &Expr, op: BoolOp, out: &mut Vec<PredicateNode>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } if op == BoolOp::And => {
            flatten_connective(left, op, out);
            flatten_connective(right, op, out);
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } if op == BoolOp::Or => {
            flatten_connective(left, op, out);
            flatten_connective(right, op, out);
        }
        Expr::Nested(inner) => flatten_connective(inner, op, out),
        other => out.push(build_predicate_tree(other)),
    }
}

/// Build a conjunct leaf, extracting structured parts for simple
/// `column op literal` comparisons (either operand order).
fn conjunct_from_expr(expr: &Expr) -> Conjunct {
    let sql = expr.to_string();

    if let Expr::BinaryOp { left, op, right } = expr {
        if is_comparison(op) {
            if let (Some((relation, column)), true) = (column_parts(left), is_literal(right)) {
                return Conjunct {
                    sql,
                    relation,
                    column: Some(column),
                    operator: Some(op.to_string()),
                    literal: Some(right.to_string()),
                };
            }
            if let (true, Some((relation, column))) = (is_literal(left), column_parts(right)) {
                return Conjunct {
                    sql,
                    relation,
                    column: Some(column),
                    operator: Some(flip_comparison(op)),
                    literal: Some(left.to_string()),
                };
            }
        }
    }

    Conjunct::opaque(sql)
}

fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
    )
}

fn flip_comparison(op: &BinaryOperator) -> String {
    match op {
        BinaryOperator::Gt => "<".to_string(),
        BinaryOperator::GtEq => "<=".to_string(),
        BinaryOperator::Lt => ">".to_string(),
        BinaryOperator::LtEq => ">=".to_string(),
        other => other.to_string(),
    }
}

fn column_parts(expr: &Expr) -> Option<(Option<String>, String)> {
    match expr {
        Expr::Identifier(ident) => Some((None, ident.value.clone())),
        Expr::CompoundIdentifier(idents) if idents.len() >= 2 => Some((
            Some(idents[idents.len() - 2].value.clone()),
            idents[idents.len() - 1].value.clone(),
        )),
        _ => None,
    }
}

fn is_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Value(_) => true,
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => matches!(inner.as_ref(), Expr::Value(_)),
        _ => false,
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
