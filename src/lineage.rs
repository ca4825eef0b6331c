//! Lineage records and the per-statement pipeline producing them.

pub mod builder;
pub mod functions;

use serde::{Deserialize, Serialize};
use strum::IntoDiscriminant;
use uuid::Uuid;

use crate::{
    config::LineageConfig,
    cte::{CteMap, merge_nested_ctes, starts_with_with, unwrap_with},
    scanner::{find_top_level, split_statements, strip_comments},
    target::{Target, classify, parse_target},
};
use builder::{ADVISORY_UNRECOGNIZED, ADVISORY_WITH_NO_MAIN, RecordBuilder};

/// `source_table` of a value computed by a function with no source column.
pub const SOURCE_FUNCTIONS: &str = "functions";
/// `transform` of a column copied unchanged.
pub const COPY: &str = "copy";

/// One source -> destination data-flow edge, at table or column granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub id: Uuid,
    /// Normalized text of the statement the record was derived from.
    pub query: String,
    pub source_table: Option<String>,
    pub dest_table: Option<String>,
    pub source_column: Option<String>,
    pub dest_column: Option<String>,
    pub transform: Option<String>,
    pub advisory: String,
}

impl LineageRecord {
    pub fn is_table_level(&self) -> bool {
        self.source_column.is_none() && self.dest_column.is_none() && self.transform.is_none()
    }
}

/// Strips comments and backtick quoting, lower-cases and collapses whitespace.
pub fn normalize_sql(sql: &str) -> String {
    strip_comments(sql)
        .replace('`', "")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts lineage from a script of `;`-separated statements.
///
/// Records come in statement order, then select-item order, then origin-token
/// order. Every statement yields at least one record.
pub fn extract_lineage(sql: &str, config: &LineageConfig) -> Vec<LineageRecord> {
    let normalized = normalize_sql(sql);
    split_statements(&normalized)
        .into_iter()
        .flat_map(|stmt| statement_lineage(stmt, config))
        .collect()
}

/// Lineage of one normalized statement.
pub fn statement_lineage(stmt: &str, config: &LineageConfig) -> Vec<LineageRecord> {
    log::debug!("Statement ({}): {}", classify(stmt), stmt);

    if starts_with_with(stmt) {
        let Some((ctes, main)) = unwrap_with(stmt) else {
            log::debug!("No main clause after WITH block");
            return RecordBuilder::new(stmt, None).unresolved(ADVISORY_WITH_NO_MAIN);
        };
        log::debug!("Main clause ({}): {}", classify(main), main);
        return main_lineage(stmt, main, &ctes, config);
    }
    main_lineage(stmt, stmt, &CteMap::new(), config)
}

/// Dispatches `main` (a statement with any outer WITH block removed) in the
/// order LIKE, CTAS, INSERT, SELECT. Records carry `query` as their text.
fn main_lineage(
    query: &str,
    main: &str,
    ctes: &CteMap,
    config: &LineageConfig,
) -> Vec<LineageRecord> {
    let Some(target) = parse_target(main) else {
        let builder = RecordBuilder::new(query, None);
        if find_top_level(main, "select", 0).is_some() {
            return builder.select(main, ctes, config);
        }
        return builder.unresolved(ADVISORY_UNRECOGNIZED);
    };
    log::debug!("Target {} `{}`", target.discriminant(), target.table());

    let builder = RecordBuilder::new(query, Some(target.table()));
    match &target {
        Target::Like(like) => builder.like(like),
        Target::Ctas(create) => {
            let body = &main[create.body_start..];
            let ctes = merge_nested_ctes(main, create.body_start, ctes);
            builder.select_into(body, create.columns.as_deref(), &ctes, config)
        }
        Target::Insert(insert) => {
            let body = &main[insert.body_start..];
            let ctes = merge_nested_ctes(main, insert.body_start, ctes);
            builder.select_into(body, insert.columns.as_deref(), &ctes, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineage(sql: &str) -> Vec<LineageRecord> {
        extract_lineage(sql, &LineageConfig::default())
    }

    #[test]
    fn test_normalize_sql() {
        assert_eq!(
            normalize_sql("SELECT `A`,\n\t'X  Y' -- note\nFROM /* c */ `s`.`T`"),
            "select a, 'x y' from s.t"
        );
    }

    #[test]
    fn test_insert_with_column_list() {
        let records =
            lineage("INSERT INTO s.d (id, name) SELECT t.id, t.full_name AS name FROM s.src t;");
        assert_eq!(records.len(), 2);
        for (record, (source, dest)) in records.iter().zip([("id", "id"), ("full_name", "name")]) {
            assert_eq!(record.source_table.as_deref(), Some("s.src"));
            assert_eq!(record.dest_table.as_deref(), Some("s.d"));
            assert_eq!(record.source_column.as_deref(), Some(source));
            assert_eq!(record.dest_column.as_deref(), Some(dest));
            assert_eq!(record.transform.as_deref(), Some(COPY));
        }
    }

    #[test]
    fn test_create_like() {
        let records = lineage("create table a.b like c.d;");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_table.as_deref(), Some("c.d"));
        assert_eq!(records[0].dest_table.as_deref(), Some("a.b"));
        assert!(records[0].is_table_level());
        assert_eq!(records[0].advisory, builder::ADVISORY_LIKE);
    }

    #[test]
    fn test_cte_never_reported_as_source() {
        let records = lineage("with x as (select id from p.q) insert into r.s select id from x;");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_table.as_deref(), Some("p.q"));
        assert_eq!(records[0].dest_table.as_deref(), Some("r.s"));
        assert_eq!(records[0].source_column.as_deref(), Some("id"));
        assert_eq!(records[0].dest_column.as_deref(), Some("id"));
        assert_eq!(records[0].transform.as_deref(), Some(COPY));
        assert!(records[0].query.starts_with("with x as"));
    }

    #[test]
    fn test_unrecognized_and_bare_select() {
        let records = lineage("refresh s.t; select a from s.x join s.y on s.x.k = s.y.k");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source_table, None);
        assert_eq!(records[0].dest_table, None);
        assert_eq!(records[0].advisory, ADVISORY_UNRECOGNIZED);
        assert_eq!(records[1].source_table.as_deref(), Some("s.x"));
        assert_eq!(records[2].source_table.as_deref(), Some("s.y"));
        assert!(records[1..].iter().all(|r| r.dest_table.is_none()));
    }

    #[test]
    fn test_empty_script() {
        assert!(lineage("  ;\n -- nothing\n;").is_empty());
    }
}
