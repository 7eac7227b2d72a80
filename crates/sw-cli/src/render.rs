//! Explanation rendering: aligned tables and summary bullets

use crate::cli::OutputMode;
use sw_core::{
    AggregateReport, JoinReport, PredicateReport, RowSet, WhyNotExplanation,
};

/// Calculate column widths for a table given headers and row data.
fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a formatted table to stdout: a left-aligned header row, a
/// separator line of dashes, and each data row, columns separated by
/// two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  "));

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  "));
    }
}

/// Print an arbitrary query result, capped at `max_rows`.
pub(crate) fn print_rowset(rows: &RowSet, max_rows: usize) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }
    if rows.len() > max_rows {
        println!("(showing first {} of {} rows)", max_rows, rows.len());
    }
    let headers: Vec<&str> = rows.columns.iter().map(String::as_str).collect();
    let body: Vec<Vec<String>> = rows
        .rows
        .iter()
        .take(max_rows)
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    print_table(&headers, &body);
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(p) => format!("{:.1}%", p * 100.0),
        None => "-".to_string(),
    }
}

pub(crate) fn render_aggregate(report: &AggregateReport) {
    match report {
        AggregateReport::Additive {
            function,
            actual,
            expected,
            gap,
            records,
        } => {
            println!(
                "{} actual: {}  expected: {}  gap: {}",
                function.as_sql(),
                format_number(*actual),
                format_number(*expected),
                format_number(*gap)
            );
            println!();

            let flagged = records.iter().filter(|r| r.explains_gap).count();
            if flagged > 0 {
                println!(
                    "The top {} contribution(s) marked below account for the gap.",
                    flagged
                );
                println!();
            }

            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    vec![
                        r.key_display(),
                        format_number(r.contribution),
                        format_percentage(r.percentage),
                        if r.explains_gap { "*".to_string() } else { String::new() },
                    ]
                })
                .collect();
            print_table(&["KEY", "CONTRIBUTION", "SHARE", "EXPLAINS"], &rows);
        }
        AggregateReport::Average {
            overall_avg,
            expected,
            gap,
            records,
        } => {
            println!(
                "AVG actual: {}  expected: {}  gap: {}",
                format_number(*overall_avg),
                format_number(*expected),
                format_number(*gap)
            );
            println!();

            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    vec![
                        r.key_display(),
                        format_number(r.group_sum),
                        r.group_count.to_string(),
                        format_number(r.group_avg),
                        format_number(r.influence),
                    ]
                })
                .collect();
            print_table(&["KEY", "SUM", "COUNT", "AVG", "INFLUENCE"], &rows);
        }
    }
}

pub(crate) fn render_join(report: &JoinReport) {
    if let (Some(actual), Some(expected), Some(gap)) =
        (report.actual_count, report.expected_count, report.gap)
    {
        println!(
            "rows actual: {}  expected: {}  gap: {}",
            actual, expected, gap
        );
        println!();
    }

    for edge in &report.edges {
        println!(
            "join [{}] {}  ({} <-> {}), predicted inner-join rows: {}",
            edge.edge_index, edge.condition, edge.left_label, edge.right_label, edge.predicted_rows
        );
        let rows: Vec<Vec<String>> = edge
            .records
            .iter()
            .map(|r| {
                vec![
                    r.key.clone(),
                    r.left_count.to_string(),
                    r.right_count.to_string(),
                    r.product().to_string(),
                    r.status.label().to_string(),
                ]
            })
            .collect();
        print_table(&["KEY", "LEFT", "RIGHT", "ROWS", "STATUS"], &rows);
        println!();
    }
}

pub(crate) fn render_predicate(report: &PredicateReport) {
    println!("WHERE conjuncts:");
    for (index, sql) in report.conjunct_sql.iter().enumerate() {
        println!("  [{}] {}", index, sql);
    }
    println!();

    let mut headers: Vec<String> = vec!["KEY".to_string()];
    headers.extend((0..report.conjunct_sql.len()).map(|i| format!("[{}]", i)));
    headers.push("OVERALL".to_string());
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

    let rows: Vec<Vec<String>> = report
        .verdicts
        .iter()
        .map(|v| {
            let mut row = vec![v.key_display()];
            row.extend(v.conjuncts.iter().map(|passed| pass_label(*passed)));
            row.push(if v.overall {
                "included".to_string()
            } else {
                "excluded".to_string()
            });
            row
        })
        .collect();
    print_table(&header_refs, &rows);

    let excluded = report.verdicts.iter().filter(|v| !v.overall).count();
    println!();
    println!(
        "{} of {} tuple(s) excluded by the WHERE clause.",
        excluded,
        report.verdicts.len()
    );
}

fn pass_label(passed: bool) -> String {
    if passed { "pass" } else { "FAIL" }.to_string()
}

pub(crate) fn render_why_not(explanation: &WhyNotExplanation, mode: OutputMode) {
    if matches!(mode, OutputMode::Summary | OutputMode::Both) {
        println!("Why is `{}` missing?", explanation.target);
        println!();
        if explanation.is_empty() {
            println!("- The tuple already appears in the query result.");
        } else {
            println!("- Minimal blocking constraint set (removing these admits the tuple):");
            for description in &explanation.removed_descriptions {
                println!("    - {}", description);
            }
        }
        for hint in &explanation.repair_hints {
            println!("- {}", hint);
        }
        println!();
    }

    if matches!(mode, OutputMode::Detailed | OutputMode::Both) {
        println!("Search tested {} subset(s):", explanation.tested_subsets);
        let rows: Vec<Vec<String>> = explanation
            .steps
            .iter()
            .map(|step| {
                vec![
                    if step.removed.is_empty() {
                        "(none)".to_string()
                    } else {
                        step.removed.join(" + ")
                    },
                    step.matching_rows.to_string(),
                ]
            })
            .collect();
        print_table(&["REMOVED CONSTRAINTS", "MATCHING ROWS"], &rows);
        println!();
    }
}
