use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;

use crate::{clause::is_identifier, config::LineageConfig, scanner::mask_quoted};

static EXPLICIT_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+as\s+([a-z0-9_]+)\s*$").unwrap());
static TRAILING_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([a-z0-9_]+)\s*$").unwrap());
static STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-z0-9_]+\.){0,2}\*$").unwrap());
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9_]+(?:\.[a-z0-9_]+){0,2}").unwrap());

/// One expression of a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub raw: String,
    /// The expression with any alias removed.
    pub expr: String,
    pub alias: Option<String>,
    /// Candidate origin columns (`col`, `t.col` or `s.t.col`), deduplicated in
    /// first-seen order. For `t.*` this is the literal star text.
    pub origin_tokens: Vec<String>,
    pub is_star: bool,
}

impl SelectItem {
    pub fn parse(raw: &str, config: &LineageConfig) -> Self {
        let (expr, alias) = split_alias(raw.trim(), config);

        if expr == "*" || STAR_RE.is_match(expr) {
            return Self {
                raw: raw.to_owned(),
                expr: expr.to_owned(),
                alias,
                origin_tokens: vec![expr.to_owned()],
                is_star: true,
            };
        }

        let origin_tokens = origin_tokens(expr, config);
        log::debug!("Select item `{}` -> origins {:?}", raw, origin_tokens);
        Self {
            raw: raw.to_owned(),
            expr: expr.to_owned(),
            alias,
            origin_tokens,
            is_star: false,
        }
    }

    /// The expression is exactly its single origin column.
    pub fn is_copy(&self) -> bool {
        matches!(self.origin_tokens.as_slice(), [token] if *token == self.expr)
    }

    /// Name the item gets in the output when no column list is given: the
    /// alias, else the last segment of the last origin token.
    pub fn output_name(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(alias);
        }
        self.origin_tokens
            .last()
            .and_then(|token| token.rsplit('.').next())
    }
}

/// Separates a trailing alias from an item.
///
/// An explicit `as name` always wins. Otherwise a trailing bare word is taken
/// as an implicit alias only when the rest contains whitespace and does not end
/// in `)` or `]`: `a + b total` yields `total`, while `t.a b` and
/// `f(a, b) c` yield no alias.
fn split_alias<'a>(item: &'a str, config: &LineageConfig) -> (&'a str, Option<String>) {
    if let Some(caps) = EXPLICIT_ALIAS_RE.captures(item) {
        let start = caps.get(0).map_or(item.len(), |m| m.start());
        return (item[..start].trim(), Some(caps[1].to_owned()));
    }

    if let Some(caps) = TRAILING_WORD_RE.captures(item) {
        let start = caps.get(0).map_or(item.len(), |m| m.start());
        let before = item[..start].trim();
        let word = &caps[1];
        if before.contains(char::is_whitespace)
            && !before.ends_with(')')
            && !before.ends_with(']')
            && is_identifier(word)
            && !config.is_reserved(word)
        {
            return (before, Some(word.to_owned()));
        }
    }
    (item, None)
}

/// Dot-path identifiers of an expression, skipping quoted literals, numbers,
/// function names and reserved words.
fn origin_tokens(expr: &str, config: &LineageConfig) -> Vec<String> {
    let masked = mask_quoted(expr);
    let mut tokens = IndexSet::new();
    for m in TOKEN_RE.find_iter(&masked) {
        let token = m.as_str();
        if !is_identifier(token) || config.is_reserved(token) {
            continue;
        }
        if masked[m.end()..].trim_start().starts_with('(') {
            continue;
        }
        tokens.insert(token.to_owned());
    }
    tokens.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> SelectItem {
        SelectItem::parse(raw, &LineageConfig::default())
    }

    #[test]
    fn test_explicit_alias() {
        let item = parse("t.full_name as name");
        assert_eq!(item.expr, "t.full_name");
        assert_eq!(item.alias.as_deref(), Some("name"));
        assert_eq!(item.origin_tokens, vec!["t.full_name"]);
        assert!(item.is_copy());
    }

    #[test]
    fn test_implicit_alias() {
        let item = parse("a.x + b.y total");
        assert_eq!(item.expr, "a.x + b.y");
        assert_eq!(item.alias.as_deref(), Some("total"));
        assert_eq!(item.origin_tokens, vec!["a.x", "b.y"]);
        assert!(!item.is_copy());

        // no internal whitespace before the trailing word
        let item = parse("t.a b");
        assert_eq!(item.alias, None);
        assert_eq!(item.origin_tokens, vec!["t.a", "b"]);

        // nothing is taken after a closing parenthesis or from reserved words
        let item = parse("coalesce(a, b) c");
        assert_eq!(item.alias, None);
        assert_eq!(item.origin_tokens, vec!["a", "b", "c"]);
        assert_eq!(parse("sum(a) over (partition by b)").alias, None);
        assert_eq!(parse("case when a then b else c end").alias, None);
    }

    #[test]
    fn test_star() {
        let item = parse("t.*");
        assert!(item.is_star);
        assert_eq!(item.origin_tokens, vec!["t.*"]);
        assert!(parse("*").is_star);
        assert!(!parse("count(*)").is_star);
    }

    #[test]
    fn test_tokens_skip_functions_literals_and_reserved_words() {
        let item = parse("cast(concat(t.a, '-', 'lit.x') as string)");
        assert_eq!(item.origin_tokens, vec!["t.a"]);

        let item = parse("case when s.t.a > 10 then s.t.a else 0.5 end");
        assert_eq!(item.origin_tokens, vec!["s.t.a"]);

        let item = parse("my_udf(x, x, y)");
        assert_eq!(item.origin_tokens, vec!["x", "y"]);

        assert!(parse("now()").origin_tokens.is_empty());
        assert!(parse("'constant'").origin_tokens.is_empty());
    }

    #[test]
    fn test_output_name() {
        assert_eq!(parse("t.a").output_name(), Some("a"));
        assert_eq!(parse("t.a as b").output_name(), Some("b"));
        assert_eq!(parse("1").output_name(), None);
    }
}
