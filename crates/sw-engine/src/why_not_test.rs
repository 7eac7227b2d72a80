use super::*;
use sw_db::DuckDbAdapter;
use sw_sql::{build_query_model, SqlParser};

fn model(sql: &str) -> QueryModel {
    let stmt = SqlParser::duckdb().parse_single(sql).unwrap();
    build_query_model(&stmt).unwrap()
}

fn target(table: &str, key_predicate: &str) -> TargetTuple {
    TargetTuple {
        table: table.to_string(),
        key_predicate: key_predicate.to_string(),
    }
}

async fn films_db() -> DuckDbAdapter {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE films (id INTEGER, year INTEGER, rating DOUBLE);
         INSERT INTO films VALUES (1, 2015, 7.0), (2, 2015, 9.0), (3, 2005, 9.5);",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_single_blocking_conjunct() {
    let db = films_db().await;
    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010 AND rating > 8");

    let explanation = analyzer
        .analyze(&m, &target("films", "id = 1"))
        .await
        .unwrap();

    assert_eq!(
        explanation.removed_conjuncts,
        std::collections::BTreeSet::from([1])
    );
    assert!(explanation.removed_join_edges.is_empty());
    assert_eq!(explanation.removed_descriptions, vec!["rating > 8"]);
    assert!(explanation.is_minimal);
    // empty set, {year > 2010}, then {rating > 8} succeeded
    assert_eq!(explanation.tested_subsets, 3);
    assert!(explanation
        .repair_hints
        .iter()
        .any(|h| h.contains("rating")));
}

#[tokio::test]
async fn test_search_is_monotonic() {
    let db = films_db().await;
    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010 AND rating > 8");

    let explanation = analyzer
        .analyze(&m, &target("films", "id = 3"))
        .await
        .unwrap();

    // id = 3 fails the year conjunct only
    assert_eq!(
        explanation.removed_conjuncts,
        std::collections::BTreeSet::from([0])
    );
    assert_eq!(explanation.steps.len(), explanation.tested_subsets);
    // every step before the successful one found nothing
    let (last, earlier) = explanation.steps.split_last().unwrap();
    assert!(last.matching_rows > 0);
    assert!(earlier.iter().all(|s| s.matching_rows == 0));
    // subsets were tested in non-decreasing size order
    let sizes: Vec<usize> = explanation.steps.iter().map(|s| s.removed.len()).collect();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_blocking_join_edge() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (id INTEGER, region VARCHAR);
         CREATE TABLE rates (region VARCHAR, rate DOUBLE);
         INSERT INTO sales VALUES (1, 'west'), (2, 'east');
         INSERT INTO rates VALUES ('west', 1.1);",
    )
    .await
    .unwrap();

    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM sales AS s JOIN rates AS r ON s.region = r.region");

    // sale 2 is 'east': no matching rate row blocks it
    let explanation = analyzer
        .analyze(&m, &target("sales", "s.id = 2"))
        .await
        .unwrap();

    assert!(explanation.removed_conjuncts.is_empty());
    assert_eq!(
        explanation.removed_join_edges,
        std::collections::BTreeSet::from([0])
    );
    assert!(explanation
        .repair_hints
        .iter()
        .any(|h| h.contains("rates")));
}

#[tokio::test]
async fn test_conjunct_and_edge_removed_together() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (id INTEGER, region VARCHAR, amount DOUBLE);
         CREATE TABLE rates (region VARCHAR, rate DOUBLE);
         INSERT INTO sales VALUES (1, 'east', 50.0);
         INSERT INTO rates VALUES ('west', 1.1);",
    )
    .await
    .unwrap();

    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model(
        "SELECT * FROM sales AS s JOIN rates AS r ON s.region = r.region \
         WHERE s.amount > 100",
    );

    let explanation = analyzer
        .analyze(&m, &target("sales", "s.id = 1"))
        .await
        .unwrap();

    // both the amount predicate and the region join block the tuple
    assert_eq!(
        explanation.removed_conjuncts,
        std::collections::BTreeSet::from([0])
    );
    assert_eq!(
        explanation.removed_join_edges,
        std::collections::BTreeSet::from([0])
    );
    assert_eq!(explanation.removed_descriptions.len(), 2);
}

#[tokio::test]
async fn test_tuple_already_present() {
    let db = films_db().await;
    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010 AND rating > 8");

    let explanation = analyzer
        .analyze(&m, &target("films", "id = 2"))
        .await
        .unwrap();

    assert!(explanation.is_empty());
    assert_eq!(explanation.tested_subsets, 1);
    assert!(explanation.repair_hints.is_empty());
}

#[tokio::test]
async fn test_missing_base_row_is_unreachable() {
    let db = films_db().await;
    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010");

    let err = analyzer
        .analyze(&m, &target("films", "id = 999"))
        .await
        .unwrap_err();
    let EngineError::TupleUnreachable { detail, .. } = err else {
        panic!("expected TupleUnreachable");
    };
    assert!(detail.contains("no row in table 'films'"));
}

#[tokio::test]
async fn test_exhausted_search_is_unreachable() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (id INTEGER, region VARCHAR);
         CREATE TABLE rates (region VARCHAR, rate DOUBLE);
         INSERT INTO sales VALUES (1, 'west');",
    )
    .await
    .unwrap();

    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM sales AS s JOIN rates AS r ON s.region = r.region");

    // rates is empty: even ON TRUE produces no joined row
    let err = analyzer
        .analyze(&m, &target("sales", "s.id = 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TupleUnreachable { .. }));
}

#[tokio::test]
async fn test_unknown_target_table_is_invalid() {
    let db = films_db().await;
    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM films WHERE year > 2010");

    let err = analyzer
        .analyze(&m, &target("actors", "id = 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter { .. }));
}

#[tokio::test]
async fn test_no_candidates_is_invalid() {
    let db = films_db().await;
    let analyzer = WhyNotAnalyzer::new(&db);
    let m = model("SELECT * FROM films");

    let err = analyzer
        .analyze(&m, &target("films", "id = 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameter { .. }));
}
