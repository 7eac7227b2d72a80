use super::*;
use sw_db::DuckDbAdapter;
use sw_sql::{build_query_model, SqlParser};

fn model(sql: &str) -> QueryModel {
    let stmt = SqlParser::duckdb().parse_single(sql).unwrap();
    build_query_model(&stmt).unwrap()
}

async fn sales_db() -> DuckDbAdapter {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (order_id INTEGER, region VARCHAR, amount DOUBLE);
         INSERT INTO sales VALUES
           (1, 'west', 2500.0),
           (2, 'west', 1500.0),
           (3, 'east', 600.0),
           (4, 'east', 300.0),
           (5, 'north', 100.0);",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_sum_contributions_sorted_and_summing_to_actual() {
    let db = sales_db().await;
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT SUM(amount) FROM sales");

    let report = analyzer
        .analyze(&m, 3000.0, &["order_id".to_string()])
        .await
        .unwrap();

    let AggregateReport::Additive {
        actual,
        expected,
        gap,
        records,
        ..
    } = report
    else {
        panic!("expected additive report");
    };

    assert_eq!(actual, 5000.0);
    assert_eq!(expected, 3000.0);
    assert_eq!(gap, 2000.0);

    // Sorted descending by contribution
    let contributions: Vec<f64> = records.iter().map(|r| r.contribution).collect();
    assert_eq!(contributions, vec![2500.0, 1500.0, 600.0, 300.0, 100.0]);

    // Contributions sum to the actual total (1e-6 relative tolerance)
    let sum: f64 = contributions.iter().sum();
    assert!((sum - actual).abs() <= 1e-6 * actual.abs());

    // Greedy explaining prefix covers the 2000 gap with the single
    // largest contribution
    let flagged: Vec<f64> = records
        .iter()
        .filter(|r| r.explains_gap)
        .map(|r| r.contribution)
        .collect();
    assert_eq!(flagged, vec![2500.0]);
    assert!(flagged.iter().sum::<f64>() >= gap);
}

#[tokio::test]
async fn test_grouped_sum_uses_group_keys() {
    let db = sales_db().await;
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT region, SUM(amount) FROM sales GROUP BY region");

    let report = analyzer.analyze(&m, 1000.0, &[]).await.unwrap();
    let AggregateReport::Additive { records, .. } = report else {
        panic!("expected additive report");
    };

    let keys: Vec<String> = records.iter().map(|r| r.key_display()).collect();
    assert_eq!(keys, vec!["west", "east", "north"]);
    assert_eq!(records[0].contribution, 4000.0);
    assert_eq!(records[0].percentage, Some(0.8));
}

#[tokio::test]
async fn test_count_contributions() {
    let db = sales_db().await;
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT region, COUNT(*) FROM sales GROUP BY region");

    let report = analyzer.analyze(&m, 5.0, &[]).await.unwrap();
    let AggregateReport::Additive { actual, records, .. } = report else {
        panic!("expected additive report");
    };
    assert_eq!(actual, 5.0);
    // west and east tie at 2; keys break the tie ascending
    assert_eq!(records[0].key_display(), "east");
    assert_eq!(records[1].key_display(), "west");
    assert_eq!(records[2].key_display(), "north");
    assert!(records.iter().all(|r| !r.explains_gap));
}

#[tokio::test]
async fn test_avg_influence_ranking() {
    let db = sales_db().await;
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT region, AVG(amount) FROM sales GROUP BY region");

    let report = analyzer.analyze(&m, 500.0, &[]).await.unwrap();
    let AggregateReport::Average {
        overall_avg,
        records,
        ..
    } = report
    else {
        panic!("expected average report");
    };

    assert_eq!(overall_avg, 1000.0);
    // west: avg 2000, count 2 -> influence 2000
    // east: avg 450, count 2 -> influence 1100
    // north: avg 100, count 1 -> influence 900
    assert_eq!(records[0].key_display(), "west");
    assert_eq!(records[0].group_avg, 2000.0);
    assert_eq!(records[0].influence, 2000.0);
    assert_eq!(records[1].key_display(), "east");
    assert_eq!(records[2].key_display(), "north");
}

#[tokio::test]
async fn test_zero_total_has_no_percentages() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (order_id INTEGER, amount DOUBLE);
         INSERT INTO sales VALUES (1, 50.0), (2, -50.0);",
    )
    .await
    .unwrap();
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT SUM(amount) FROM sales");

    let report = analyzer
        .analyze(&m, 10.0, &["order_id".to_string()])
        .await
        .unwrap();
    let AggregateReport::Additive { actual, records, .. } = report else {
        panic!("expected additive report");
    };
    assert_eq!(actual, 0.0);
    assert!(records.iter().all(|r| r.percentage.is_none()));
}

#[tokio::test]
async fn test_negative_gap_flags_negative_contributions() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE adjustments (id INTEGER, delta DOUBLE);
         INSERT INTO adjustments VALUES (1, 100.0), (2, -80.0), (3, -40.0), (4, 20.0);",
    )
    .await
    .unwrap();
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT SUM(delta) FROM adjustments");

    // actual 0, expected 100 -> gap -100; the two negative rows explain it
    let report = analyzer
        .analyze(&m, 100.0, &["id".to_string()])
        .await
        .unwrap();
    let AggregateReport::Additive { records, .. } = report else {
        panic!("expected additive report");
    };
    // records stay in descending order; both negative rows are flagged
    let flagged: Vec<f64> = records
        .iter()
        .filter(|r| r.explains_gap)
        .map(|r| r.contribution)
        .collect();
    assert_eq!(flagged, vec![-40.0, -80.0]);
}

#[tokio::test]
async fn test_ungrouped_without_keys_is_invalid() {
    let db = sales_db().await;
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT SUM(amount) FROM sales");
    let err = analyzer.analyze(&m, 1.0, &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter { .. }));
}

#[tokio::test]
async fn test_deterministic_across_runs() {
    let db = sales_db().await;
    let analyzer = AggregateAnalyzer::new(&db);
    let m = model("SELECT region, SUM(amount) FROM sales GROUP BY region");

    let first = analyzer.analyze(&m, 1000.0, &[]).await.unwrap();
    let second = analyzer.analyze(&m, 1000.0, &[]).await.unwrap();
    let (AggregateReport::Additive { records: a, .. }, AggregateReport::Additive { records: b, .. }) =
        (first, second)
    else {
        panic!("expected additive reports");
    };
    assert_eq!(a, b);
}
