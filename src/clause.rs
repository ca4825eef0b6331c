use regex::Regex;
use std::sync::LazyLock;

use crate::{
    config::LineageConfig,
    scanner::{find_matching_paren, find_top_level, split_top_level},
};

static JOIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:left|right|full)(?:\s+(?:outer|semi|anti))?\s+|inner\s+|cross\s+|outer\s+)?join\b",
    )
    .unwrap()
});
static QUALIFIED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9_]+\.[a-z0-9_]+").unwrap());
static BARE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_]+").unwrap());
static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(?:as\s+)?([a-z0-9_]+)").unwrap());

/// Keywords closing a FROM clause at top level.
const FROM_TERMINATORS: [&str; 7] = [
    "where", "group", "having", "order", "limit", "union", "insert",
];

/// A table named in a FROM/JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableReference {
    pub name: String,
    pub alias: Option<String>,
}

impl TableReference {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            name: name.into(),
            alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromItem {
    Table(TableReference),
    /// A parenthesized sub-query, e.g. `(select ...) t`.
    Derived { body: String, alias: Option<String> },
}

/// Returns the end of the `select` keyword and the start of its `from`.
fn select_span(stmt: &str) -> Option<(usize, usize)> {
    let select_pos = find_top_level(stmt, "select", 0)?;
    let items_start = select_pos + "select".len();
    let from_pos = find_top_level(stmt, "from", items_start)?;
    Some((items_start, from_pos))
}

/// The raw SELECT items of `stmt`, split at top-level commas.
///
/// Empty items are kept (`select a,,b`), so callers can tell a malformed list
/// apart and positional mappings stay aligned.
pub fn select_items(stmt: &str) -> Vec<&str> {
    match select_span(stmt) {
        Some((items_start, from_pos)) => split_top_level(&stmt[items_start..from_pos], ','),
        None => vec![],
    }
}

/// The text following the top-level `from` up to the next clause keyword.
pub fn from_clause(stmt: &str) -> &str {
    let Some((_, from_pos)) = select_span(stmt) else {
        return "";
    };
    let start = from_pos + "from".len();
    let end = FROM_TERMINATORS
        .iter()
        .filter_map(|kw| find_top_level(stmt, kw, start))
        .min()
        .unwrap_or(stmt.len());
    stmt[start..end].trim()
}

/// Splits a FROM/JOIN fragment into the tables and sub-queries it reads.
///
/// Join variants become commas and everything from a top-level `on` to the end
/// of its fragment is dropped.
pub fn from_items(from_clause: &str, config: &LineageConfig) -> Vec<FromItem> {
    let rewritten = JOIN_RE.replace_all(from_clause, ",");
    let mut items = vec![];

    for fragment in split_top_level(&rewritten, ',') {
        let fragment = match find_top_level(fragment, "on", 0) {
            Some(on_pos) => fragment[..on_pos].trim(),
            None => fragment,
        };
        if fragment.is_empty() {
            continue;
        }

        if fragment.starts_with('(') {
            let Some(close) = find_matching_paren(fragment, 0) else {
                log::debug!("Unbalanced parenthesis in FROM fragment `{}`", fragment);
                continue;
            };
            let body = fragment[1..close].trim();
            if find_top_level(body, "select", 0).is_some() {
                items.push(FromItem::Derived {
                    body: body.to_owned(),
                    alias: trailing_alias(&fragment[close + 1..], config),
                });
            } else {
                // parenthesized join: `(a join b on ...)`
                items.extend(from_items(body, config));
            }
            continue;
        }

        let matched = QUALIFIED_NAME_RE.find(fragment).or_else(|| {
            BARE_NAME_RE
                .find(fragment)
                .filter(|m| is_identifier(m.as_str()) && !config.is_reserved(m.as_str()))
        });
        if let Some(m) = matched {
            items.push(FromItem::Table(TableReference::new(
                m.as_str(),
                trailing_alias(&fragment[m.end()..], config),
            )));
        }
    }
    items
}

/// Physical and CTE table references of a FROM clause, skipping sub-queries.
pub fn table_references(from_clause: &str, config: &LineageConfig) -> Vec<TableReference> {
    from_items(from_clause, config)
        .into_iter()
        .filter_map(|item| match item {
            FromItem::Table(table) => Some(table),
            FromItem::Derived { .. } => None,
        })
        .collect()
}

fn trailing_alias(rest: &str, config: &LineageConfig) -> Option<String> {
    let caps = ALIAS_RE.captures(rest)?;
    let alias = caps.get(1)?.as_str();
    (is_identifier(alias) && !config.is_reserved(alias)).then(|| alias.to_owned())
}

/// Identifiers never start with a digit.
pub(crate) fn is_identifier(token: &str) -> bool {
    token
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
}
