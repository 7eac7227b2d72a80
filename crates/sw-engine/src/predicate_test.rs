use super::*;
use sw_db::DuckDbAdapter;
use sw_sql::{build_query_model, SqlParser};

fn model(sql: &str) -> QueryModel {
    let stmt = SqlParser::duckdb().parse_single(sql).unwrap();
    build_query_model(&stmt).unwrap()
}

async fn films_db() -> DuckDbAdapter {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE films (id INTEGER, year INTEGER, rating DOUBLE);
         INSERT INTO films VALUES
           (1, 2015, 7.0),
           (2, 2015, 9.0),
           (3, 2005, 9.0),
           (4, 2005, 6.0);",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_and_attribution() {
    let db = films_db().await;
    let analyzer = PredicateAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010 AND rating > 8");

    let report = analyzer.analyze(&m, &["id".to_string()]).await.unwrap();
    assert_eq!(report.conjunct_sql, vec!["year > 2010", "rating > 8"]);
    assert_eq!(report.verdicts.len(), 4);

    // film 1: year passes, rating fails, overall excluded
    let v1 = &report.verdicts[0];
    assert_eq!(v1.key, vec!["1"]);
    assert_eq!(v1.conjuncts, vec![true, false]);
    assert!(!v1.overall);
    assert!(!v1.included);

    // film 2 passes both
    let v2 = &report.verdicts[1];
    assert_eq!(v2.conjuncts, vec![true, true]);
    assert!(v2.overall);
    assert!(v2.included);
}

#[tokio::test]
async fn test_verdicts_match_observed_membership() {
    let db = films_db().await;
    let analyzer = PredicateAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010 AND (rating > 8 OR id = 4)");

    let report = analyzer.analyze(&m, &["id".to_string()]).await.unwrap();
    for verdict in &report.verdicts {
        assert_eq!(
            verdict.overall, verdict.included,
            "tree evaluation diverged from observed membership for key {:?}",
            verdict.key
        );
    }
}

#[tokio::test]
async fn test_or_tree_evaluation() {
    let db = films_db().await;
    let analyzer = PredicateAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010 OR rating > 8");

    let report = analyzer.analyze(&m, &["id".to_string()]).await.unwrap();
    // films 1, 2 (year) and 3 (rating) pass; film 4 fails both
    let overall: Vec<bool> = report.verdicts.iter().map(|v| v.overall).collect();
    assert_eq!(overall, vec![true, true, true, false]);
}

#[tokio::test]
async fn test_join_query_attribution() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (id INTEGER, region VARCHAR, amount DOUBLE);
         CREATE TABLE rates (region VARCHAR, rate DOUBLE);
         INSERT INTO sales VALUES (1, 'west', 50), (2, 'west', 500), (3, 'east', 700);
         INSERT INTO rates VALUES ('west', 1.1), ('east', 0.9);",
    )
    .await
    .unwrap();

    let analyzer = PredicateAnalyzer::new(&db);
    let m = model(
        "SELECT * FROM sales AS s JOIN rates AS r ON s.region = r.region \
         WHERE s.amount > 100 AND r.rate > 1.0",
    );

    let report = analyzer.analyze(&m, &["s.id".to_string()]).await.unwrap();
    assert_eq!(report.verdicts.len(), 3);

    // sale 1: amount fails, rate passes
    assert_eq!(report.verdicts[0].conjuncts, vec![false, true]);
    // sale 2: both pass
    assert_eq!(report.verdicts[1].conjuncts, vec![true, true]);
    assert!(report.verdicts[1].included);
    // sale 3: amount passes, rate fails
    assert_eq!(report.verdicts[2].conjuncts, vec![true, false]);
}

#[tokio::test]
async fn test_requires_where_clause() {
    let db = films_db().await;
    let analyzer = PredicateAnalyzer::new(&db);
    let m = model("SELECT * FROM films");
    let err = analyzer.analyze(&m, &["id".to_string()]).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter { .. }));
}

#[tokio::test]
async fn test_requires_key_columns() {
    let db = films_db().await;
    let analyzer = PredicateAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010");
    let err = analyzer.analyze(&m, &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter { .. }));
}
