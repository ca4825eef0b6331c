//! WITH-block parsing and recursive expansion of CTE references into the
//! physical tables they read.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::sync::LazyLock;

use crate::{
    clause::{FromItem, TableReference, from_clause, from_items},
    config::LineageConfig,
    scanner::{find_top_level, split_top_level},
};

static CTE_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([a-z0-9_]+)\s+as\s*\((.*)\)$").unwrap());

/// CTE name -> body of its sub-query, in definition order.
pub type CteMap = IndexMap<String, String>;

/// Start of the statement a WITH block at `with_pos` introduces.
pub fn main_clause_pos(stmt: &str, with_pos: usize) -> Option<usize> {
    let from = with_pos + "with".len();
    ["insert", "create", "select"]
        .iter()
        .filter_map(|kw| find_top_level(stmt, kw, from))
        .min()
}

/// Parses the WITH block starting at `with_pos`, returning its definitions and
/// the start of the main clause.
pub fn parse_cte_block(stmt: &str, with_pos: usize) -> Option<(CteMap, usize)> {
    let main_pos = main_clause_pos(stmt, with_pos)?;
    let defs = &stmt[with_pos + "with".len()..main_pos];

    let mut ctes = CteMap::new();
    for def in split_top_level(defs, ',') {
        match CTE_DEF_RE.captures(def) {
            Some(caps) => {
                let name = caps[1].to_owned();
                let body = caps[2].trim().to_owned();
                log::debug!("CTE `{}`: {}", name, body);
                ctes.insert(name, body);
            }
            None => log::warn!("Skipping unrecognized CTE definition `{}`", def),
        }
    }
    Some((ctes, main_pos))
}

/// Splits a WITH-wrapped statement into its definitions and main clause.
///
/// Returns `None` if the statement does not start with `with` or the main
/// clause cannot be located.
pub fn unwrap_with(stmt: &str) -> Option<(CteMap, &str)> {
    if !starts_with_with(stmt) {
        return None;
    }
    let (ctes, main_pos) = parse_cte_block(stmt, 0)?;
    Some((ctes, &stmt[main_pos..]))
}

pub fn starts_with_with(stmt: &str) -> bool {
    stmt.trim_start().starts_with("with ")
}

/// Merges the definitions of a WITH block found at or after `from` (e.g. the
/// body of a CTAS) over an inherited map.
pub fn merge_nested_ctes(stmt: &str, from: usize, inherited: &CteMap) -> CteMap {
    let mut merged = inherited.clone();
    if let Some((local, _)) =
        find_top_level(stmt, "with", from).and_then(|with_pos| parse_cte_block(stmt, with_pos))
    {
        merged.extend(local);
    }
    merged
}

/// Expands table references through CTE definitions and derived tables.
pub struct CteResolver<'a> {
    ctes: &'a CteMap,
    config: &'a LineageConfig,
}

impl<'a> CteResolver<'a> {
    pub fn new(ctes: &'a CteMap, config: &'a LineageConfig) -> Self {
        Self { ctes, config }
    }

    pub fn is_cte(&self, name: &str) -> bool {
        self.ctes.contains_key(name)
    }

    /// Physical tables read by a FROM clause.
    ///
    /// A CTE referenced without an alias lends its own name as alias, so
    /// `cte.col` tokens still resolve.
    pub fn source_tables(&self, from_clause: &str) -> Vec<TableReference> {
        let mut tables = vec![];
        for item in from_items(from_clause, self.config) {
            match item {
                FromItem::Table(mut table) => {
                    if table.alias.is_none() && self.is_cte(&table.name) {
                        table.alias = Some(table.name.clone());
                    }
                    tables.extend(self.expand(&table));
                }
                FromItem::Derived { body, alias } => {
                    tables.extend(self.expand_body(&body, alias, &mut IndexSet::new(), 1));
                }
            }
        }
        tables
    }

    /// Expands a single reference. Non-CTE tables come back unchanged.
    pub fn expand(&self, table: &TableReference) -> Vec<TableReference> {
        self.expand_table(&table.name, table.alias.clone(), &mut IndexSet::new(), 0)
    }

    fn expand_table(
        &self,
        name: &str,
        alias: Option<String>,
        visited: &mut IndexSet<String>,
        depth: usize,
    ) -> Vec<TableReference> {
        // WITH is not recursive: a CTE naming itself reads the physical table.
        if visited.last().is_some_and(|current| current == name) {
            log::debug!("CTE `{}` reads the physical table of the same name", name);
            return vec![TableReference::new(name, alias)];
        }
        if visited.contains(name) {
            log::warn!("Cyclic reference to CTE `{}` ignored", name);
            return vec![];
        }
        let Some(body) = self.ctes.get(name) else {
            return vec![TableReference::new(name, alias)];
        };
        if depth >= self.config.max_expansion_depth {
            log::warn!(
                "Expansion of CTE `{}` stopped at depth {}",
                name,
                self.config.max_expansion_depth
            );
            return vec![];
        }

        visited.insert(name.to_owned());
        let tables = self.expand_body(body, alias, visited, depth + 1);
        visited.shift_remove(name);
        tables
    }

    fn expand_body(
        &self,
        body: &str,
        alias: Option<String>,
        visited: &mut IndexSet<String>,
        depth: usize,
    ) -> Vec<TableReference> {
        if depth > self.config.max_expansion_depth {
            log::warn!(
                "Sub-query expansion stopped at depth {}",
                self.config.max_expansion_depth
            );
            return vec![];
        }

        if let Some((local, main)) = unwrap_with(body) {
            let mut merged = self.ctes.clone();
            merged.extend(local);
            return CteResolver::new(&merged, self.config).expand_body(main, alias, visited, depth);
        }

        let mut tables = vec![];
        for item in from_items(from_clause(body), self.config) {
            match item {
                FromItem::Table(inner) => {
                    let inner_alias = alias.clone().or(inner.alias);
                    tables.extend(self.expand_table(&inner.name, inner_alias, visited, depth));
                }
                FromItem::Derived {
                    body: derived,
                    alias: inner_alias,
                } => {
                    let inner_alias = alias.clone().or(inner_alias);
                    tables.extend(self.expand_body(&derived, inner_alias, visited, depth + 1));
                }
            }
        }
        tables
    }
}
