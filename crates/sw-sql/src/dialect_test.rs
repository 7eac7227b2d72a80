use super::*;

#[test]
fn test_duckdb_parse() {
    let dialect = DuckDbDialect::new();
    let stmts = dialect.parse("SELECT * FROM sales").unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_postgres_parse() {
    let dialect = PostgresDialect::new();
    let stmts = dialect.parse("SELECT * FROM sales").unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_quote_ident() {
    let dialect = DuckDbDialect::new();
    assert_eq!(dialect.quote_ident("order"), "\"order\"");
    assert_eq!(dialect.quote_ident("od\"d"), "\"od\"\"d\"");
}

#[test]
fn test_parse_error_is_reported() {
    let dialect = DuckDbDialect::new();
    let result = dialect.parse("SELEC amount FROM sales");
    assert!(matches!(result, Err(SqlError::ParseError { .. })));
}
