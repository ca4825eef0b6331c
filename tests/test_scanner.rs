use impala_lineage::scanner::{Scanner, find_top_level, split_statements, split_top_level};

#[test]
fn test_scanner_tracks_depth_and_quotes() {
    let sql = "f(a, 'b(') + g";
    let mut scanner = Scanner::new(sql);
    let top_level: String = scanner
        .by_ref()
        .filter(|pos| pos.top_level)
        .map(|pos| pos.byte as char)
        .collect();
    assert_eq!(top_level, "f + g");
    assert_eq!(scanner.depth(), 0);
    assert!(!scanner.in_quote());
}

#[test]
fn test_successive_keyword_search() {
    let sql = "select a from (select b from t) x join y on x.k = y.k";
    let mut scanner = Scanner::new(sql);
    assert_eq!(scanner.find_keyword("select"), Some(0));
    assert_eq!(scanner.find_keyword("from"), Some(9));
    assert_eq!(scanner.find_keyword("from"), None);
    assert_eq!(find_top_level(sql, "on", 0), Some(41));
}

#[test]
fn test_unbalanced_quote_hides_the_rest() {
    assert_eq!(find_top_level("select 'oops from t", "from", 0), None);
    assert_eq!(split_statements("select 'a;b; select 1"), vec!["select 'a;b; select 1"]);
}

#[test]
fn test_split_keeps_nested_delimiters() {
    assert_eq!(
        split_top_level("a, max(b, c) over (partition by d, e), \"f,g\"", ','),
        vec!["a", "max(b, c) over (partition by d, e)", "\"f,g\""]
    );
}
