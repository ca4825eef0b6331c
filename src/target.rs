//! Destination of a statement: INSERT, CREATE TABLE AS SELECT or CREATE
//! TABLE LIKE.

use regex::Regex;
use std::sync::LazyLock;
use strum_macros::EnumDiscriminants;

use crate::{
    cte::starts_with_with,
    scanner::{find_matching_paren, find_top_level, split_top_level},
};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+(?:\.[a-z0-9_]+)?").unwrap());
static QUALIFIED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9_]+\.[a-z0-9_]+").unwrap());
static LIKE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:parquet|orc|avro)\s*['"]"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTarget {
    pub table: String,
    /// Explicit destination columns, e.g. `insert into t (a, b)`.
    pub columns: Option<Vec<String>>,
    /// Offset right after the destination (and its column list).
    pub body_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTarget {
    pub table: String,
    pub columns: Option<Vec<String>>,
    /// Offset of the `as` introducing the query.
    pub body_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeTarget {
    pub table: String,
    /// `None` when the schema is copied from a data file (`like parquet '...'`).
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(TargetKind), derive(strum_macros::Display))]
pub enum Target {
    Like(LikeTarget),
    Ctas(CreateTarget),
    Insert(InsertTarget),
}

impl Target {
    pub fn table(&self) -> &str {
        match self {
            Target::Like(like) => &like.table,
            Target::Ctas(create) => &create.table,
            Target::Insert(insert) => &insert.table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StatementKind {
    With,
    CreateLike,
    Ctas,
    InsertSelect,
    Select,
    Unrecognized,
}

fn skip_whitespace(stmt: &str, from: usize) -> usize {
    from + (stmt[from..].len() - stmt[from..].trim_start().len())
}

fn match_name(stmt: &str, from: usize) -> Option<(String, usize)> {
    let m = NAME_RE.find(&stmt[from..])?;
    Some((m.as_str().to_owned(), from + m.end()))
}

/// Parses `(c1, c2 type, ...)` starting at the parenthesis at `open`. Only the
/// first word of each entry is kept, reduced to its last dot segment.
fn parse_column_list(stmt: &str, open: usize) -> Option<(Vec<String>, usize)> {
    let close = find_matching_paren(stmt, open)?;
    let columns = split_top_level(&stmt[open + 1..close], ',')
        .into_iter()
        .filter_map(|entry| entry.split_whitespace().next())
        .filter_map(|word| word.rsplit('.').next())
        .filter(|col| !col.is_empty())
        .map(str::to_owned)
        .collect();
    Some((columns, close))
}

/// Parses an optional column list right after `from`, returning the columns
/// and the offset following them.
fn optional_column_list(stmt: &str, from: usize) -> (Option<Vec<String>>, usize) {
    let next = skip_whitespace(stmt, from);
    if stmt[next..].starts_with('(') {
        if let Some((columns, close)) = parse_column_list(stmt, next) {
            return (Some(columns), close + 1);
        }
    }
    (None, from)
}

pub fn parse_insert_target(stmt: &str) -> Option<InsertTarget> {
    let insert_pos = find_top_level(stmt, "insert", 0)?;

    let Some(into_pos) = find_top_level(stmt, "into", insert_pos) else {
        // `insert overwrite [table] s.t ...`: take the first qualified name.
        // A literal `table` keyword is not special-cased here, so a bare
        // destination name is not found.
        let m = QUALIFIED_NAME_RE.find(&stmt[insert_pos..])?;
        let name_end = insert_pos + m.end();
        let (columns, body_start) = optional_column_list(stmt, name_end);
        return Some(InsertTarget {
            table: m.as_str().to_owned(),
            columns,
            body_start,
        });
    };

    let mut name_start = skip_whitespace(stmt, into_pos + "into".len());
    if stmt[name_start..].starts_with("table ") {
        name_start = skip_whitespace(stmt, name_start + "table".len());
    }
    let (table, name_end) = match_name(stmt, name_start)?;
    let (columns, body_start) = optional_column_list(stmt, name_end);
    Some(InsertTarget {
        table,
        columns,
        body_start,
    })
}

/// Locates `create ... table [if not exists] <name>`, returning the offset of
/// `table`, the name and the offset following it.
fn parse_create_prefix(stmt: &str) -> Option<(usize, String, usize)> {
    let create_pos = find_top_level(stmt, "create", 0)?;
    let table_pos = find_top_level(stmt, "table", create_pos)?;
    let mut name_start = skip_whitespace(stmt, table_pos + "table".len());
    if stmt[name_start..].starts_with("if not exists") {
        name_start = skip_whitespace(stmt, name_start + "if not exists".len());
    }
    let (table, name_end) = match_name(stmt, name_start)?;
    Some((table_pos, table, name_end))
}

/// Parses a CREATE TABLE AS SELECT; plain DDL yields `None`.
pub fn parse_create_target(stmt: &str) -> Option<CreateTarget> {
    let (table_pos, table, name_end) = parse_create_prefix(stmt)?;
    let (columns, _) = optional_column_list(stmt, name_end);

    let as_pos = find_top_level(stmt, "as", table_pos)?;
    let select_pos = find_top_level(stmt, "select", table_pos)?;
    (as_pos < select_pos).then_some(CreateTarget {
        table,
        columns,
        body_start: as_pos,
    })
}

pub fn parse_like_target(stmt: &str) -> Option<LikeTarget> {
    let (_, table, name_end) = parse_create_prefix(stmt)?;
    let like_pos = skip_whitespace(stmt, name_end);
    if find_top_level(stmt, "like", like_pos) != Some(like_pos) {
        return None;
    }
    let source_start = skip_whitespace(stmt, like_pos + "like".len());
    let source = if LIKE_FILE_RE.is_match(&stmt[source_start..]) {
        None
    } else {
        match_name(stmt, source_start).map(|(name, _)| name)
    };
    Some(LikeTarget { table, source })
}

/// Destination of `stmt`, checked in the order LIKE, CTAS, INSERT.
pub fn parse_target(stmt: &str) -> Option<Target> {
    if let Some(like) = parse_like_target(stmt) {
        return Some(Target::Like(like));
    }
    if let Some(create) = parse_create_target(stmt) {
        return Some(Target::Ctas(create));
    }
    parse_insert_target(stmt).map(Target::Insert)
}

pub fn classify(stmt: &str) -> StatementKind {
    if starts_with_with(stmt) {
        return StatementKind::With;
    }
    match parse_target(stmt) {
        Some(Target::Like(_)) => StatementKind::CreateLike,
        Some(Target::Ctas(_)) => StatementKind::Ctas,
        Some(Target::Insert(_)) => StatementKind::InsertSelect,
        None if find_top_level(stmt, "select", 0).is_some() => StatementKind::Select,
        None => StatementKind::Unrecognized,
    }
}
