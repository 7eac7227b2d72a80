use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbAdapter::in_memory().unwrap();
    assert_eq!(db.backend_name(), "duckdb");
}

#[tokio::test]
async fn test_query_columns_and_rows() {
    let db = DuckDbAdapter::in_memory().unwrap();
    let rs = db.query("SELECT 1 AS id, 'west' AS region").await.unwrap();
    assert_eq!(rs.columns, vec!["id", "region"]);
    assert_eq!(rs.rows, vec![vec![Value::Int(1), Value::Text("west".into())]]);
}

#[tokio::test]
async fn test_query_value_types() {
    let db = DuckDbAdapter::in_memory().unwrap();
    let rs = db
        .query("SELECT CAST(2.5 AS DOUBLE) AS f, NULL AS missing")
        .await
        .unwrap();
    assert_eq!(rs.rows[0][0], Value::Float(2.5));
    assert_eq!(rs.rows[0][1], Value::Null);
}

#[tokio::test]
async fn test_execute_batch_and_query() {
    let db = DuckDbAdapter::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE sales (region VARCHAR, amount DOUBLE);
         INSERT INTO sales VALUES ('west', 100.0), ('east', 200.0);",
    )
    .await
    .unwrap();

    let rs = db
        .query("SELECT CAST(SUM(amount) AS DOUBLE) AS total FROM sales")
        .await
        .unwrap();
    assert_eq!(rs.scalar(), Some(&Value::Float(300.0)));
}

#[tokio::test]
async fn test_query_error_carries_sql() {
    let db = DuckDbAdapter::in_memory().unwrap();
    let err = db.query("SELECT * FROM missing_table").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("[D002]"));
    assert!(msg.contains("missing_table"));
}

#[tokio::test]
async fn test_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.duckdb");
    {
        let db = DuckDbAdapter::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE t AS SELECT 1 AS n").await.unwrap();
    }
    let db = DuckDbAdapter::new(path.to_str().unwrap()).unwrap();
    let rs = db.query("SELECT n FROM t").await.unwrap();
    assert_eq!(rs.scalar(), Some(&Value::Int(1)));
}

#[tokio::test]
async fn test_load_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv");
    std::fs::write(&path, "region,amount\nwest,100\neast,200\n").unwrap();

    let db = DuckDbAdapter::in_memory().unwrap();
    db.load_csv("sales", path.to_str().unwrap()).await.unwrap();

    let rs = db.query("SELECT COUNT(*) AS n FROM sales").await.unwrap();
    assert_eq!(rs.scalar(), Some(&Value::Int(2)));
}
