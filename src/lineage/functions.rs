//! Fixed word lists behind the lexical heuristics.
//!
//! A column that happens to share a name with an entry here is never reported
//! as an origin column. These false negatives are accepted.

use std::{collections::HashSet, sync::LazyLock};

/// Impala reserved words, type names and common built-in function names.
static RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "abort",
        "add",
        "add_months",
        "adddate",
        "aggregate",
        "all",
        "alter",
        "analytic",
        "analyze",
        "and",
        "anti",
        "any",
        "appx_median",
        "array",
        "as",
        "asc",
        "avg",
        "between",
        "bigint",
        "binary",
        "boolean",
        "both",
        "by",
        "cache",
        "case",
        "cascade",
        "cast",
        "change",
        "char",
        "coalesce",
        "collection",
        "column",
        "columns",
        "comment",
        "compute",
        "concat",
        "concat_ws",
        "count",
        "create",
        "cross",
        "current",
        "current_date",
        "current_timestamp",
        "cursor",
        "database",
        "databases",
        "date",
        "date_add",
        "date_sub",
        "datediff",
        "datetime",
        "decimal",
        "delimited",
        "desc",
        "describe",
        "distinct",
        "div",
        "double",
        "drop",
        "else",
        "end",
        "escaped",
        "except",
        "exists",
        "explain",
        "external",
        "extract",
        "false",
        "fields",
        "first",
        "first_value",
        "float",
        "floor",
        "following",
        "for",
        "format",
        "from",
        "from_timestamp",
        "from_unixtime",
        "from_utc_timestamp",
        "full",
        "function",
        "functions",
        "group",
        "group_concat",
        "having",
        "if",
        "ifnull",
        "ilike",
        "in",
        "incremental",
        "inner",
        "insert",
        "int",
        "integer",
        "intersect",
        "interval",
        "into",
        "invalidate",
        "iregexp",
        "is",
        "isnull",
        "join",
        "lag",
        "last",
        "last_day",
        "last_value",
        "lead",
        "left",
        "length",
        "like",
        "limit",
        "lines",
        "location",
        "lower",
        "lpad",
        "ltrim",
        "map",
        "max",
        "merge",
        "metadata",
        "min",
        "months_between",
        "ndv",
        "not",
        "now",
        "null",
        "nullif",
        "nulls",
        "nvl",
        "nvl2",
        "offset",
        "on",
        "or",
        "order",
        "outer",
        "over",
        "overwrite",
        "parquet",
        "partition",
        "partitioned",
        "preceding",
        "range",
        "rank",
        "real",
        "refresh",
        "regexp",
        "regexp_extract",
        "regexp_like",
        "regexp_replace",
        "rename",
        "replace",
        "right",
        "rlike",
        "round",
        "row",
        "row_number",
        "rows",
        "rpad",
        "rtrim",
        "schema",
        "schemas",
        "select",
        "semi",
        "set",
        "show",
        "smallint",
        "sort",
        "split_part",
        "sqrt",
        "stats",
        "stored",
        "string",
        "struct",
        "substr",
        "substring",
        "sum",
        "table",
        "tables",
        "tablesample",
        "tblproperties",
        "terminated",
        "textfile",
        "then",
        "timestamp",
        "tinyint",
        "to",
        "to_date",
        "to_timestamp",
        "trim",
        "true",
        "trunc",
        "truncate",
        "unbounded",
        "union",
        "unix_timestamp",
        "upper",
        "use",
        "using",
        "values",
        "varchar",
        "view",
        "when",
        "where",
        "with",
    ]
    .into_iter()
    .collect()
});

/// Zero-argument temporal functions that may appear without parentheses.
static TEMPORAL_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "current_date",
        "current_timestamp",
        "localtimestamp",
        "now",
        "sysdate",
        "unix_timestamp",
        "utc_timestamp",
    ]
    .into_iter()
    .collect()
});

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(word)
}

/// Matches `now`, `now()`, `current_timestamp` and the like.
pub fn is_temporal_function(expr: &str) -> bool {
    let name = expr.strip_suffix("()").unwrap_or(expr).trim();
    TEMPORAL_FUNCTIONS.contains(name)
}

/// Whether an expression without origin columns still reads as a computed
/// value, e.g. `uuid()` or `now`.
pub fn looks_like_function_call(expr: &str) -> bool {
    let expr = expr.trim();
    let is_case = expr == "case" || expr.starts_with("case ");
    (expr.contains('(') && expr.contains(')') && !is_case) || is_temporal_function(expr)
}
