//! Turns a classified statement into its batch of lineage records.

use anyhow::anyhow;
use uuid::Uuid;

use super::{
    COPY, LineageRecord, SOURCE_FUNCTIONS,
    functions::looks_like_function_call,
};
use crate::{
    clause::{from_clause, select_items},
    config::LineageConfig,
    cte::{CteMap, CteResolver},
    resolve::SourceTables,
    select_item::SelectItem,
    target::LikeTarget,
};

pub const ADVISORY_STAR: &str =
    "table-level relation: star projection; verify schema in metastore for column mapping";
pub const ADVISORY_NO_COLUMN_LIST: &str = "table-level relation: no destination column list and no usable select list; verify schema in metastore";
pub const ADVISORY_NO_SOURCE: &str = "table-level relation: no source table detected";
pub const ADVISORY_BY_POSITION: &str =
    "mapped by position between select list and destination column list";
pub const ADVISORY_BY_NAME: &str =
    "mapping inferred from select aliases; list destination columns for precision";
pub const ADVISORY_FUNCTION: &str = "value produced by a function call; no source column";
pub const ADVISORY_LIKE: &str = "create table like: structural copy, no column mapping";
pub const ADVISORY_LIKE_FILE: &str = "create table like data file: schema taken from file";
pub const ADVISORY_SELECT: &str = "standalone select; source tables only";
pub const ADVISORY_SELECT_NO_SOURCE: &str = "standalone select; no source table detected";
pub const ADVISORY_WITH_NO_MAIN: &str =
    "with block without a recognizable insert/create/select; review manually";
pub const ADVISORY_UNRECOGNIZED: &str =
    "no insert/create/select pattern recognized; review manually";

/// Record fields that vary within one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Edge {
    source_table: Option<String>,
    source_column: Option<String>,
    dest_column: Option<String>,
    transform: Option<String>,
    advisory: &'static str,
}

impl Edge {
    fn table(source_table: Option<String>, advisory: &'static str) -> Self {
        Self {
            source_table,
            advisory,
            ..Default::default()
        }
    }

    fn is_function(&self) -> bool {
        self.source_table.as_deref() == Some(SOURCE_FUNCTIONS)
    }
}

/// Builds the records of one statement, sharing its query text and
/// destination.
pub struct RecordBuilder<'a> {
    query: &'a str,
    dest_table: Option<&'a str>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(query: &'a str, dest_table: Option<&'a str>) -> Self {
        Self { query, dest_table }
    }

    fn record(&self, edge: Edge) -> LineageRecord {
        let lower = |value: Option<String>| value.map(|v| v.to_lowercase());
        LineageRecord {
            id: Uuid::new_v4(),
            query: self.query.to_lowercase(),
            source_table: lower(edge.source_table),
            dest_table: self.dest_table.map(str::to_lowercase),
            source_column: lower(edge.source_column),
            dest_column: lower(edge.dest_column),
            transform: lower(edge.transform),
            advisory: edge.advisory.to_lowercase(),
        }
    }

    fn records(&self, edges: Vec<Edge>) -> Vec<LineageRecord> {
        edges.into_iter().map(|edge| self.record(edge)).collect()
    }

    /// One record with every source and column field null.
    pub fn unresolved(&self, advisory: &'static str) -> Vec<LineageRecord> {
        vec![self.record(Edge::table(None, advisory))]
    }

    pub fn like(&self, like: &LikeTarget) -> Vec<LineageRecord> {
        let advisory = match like.source {
            Some(_) => ADVISORY_LIKE,
            None => ADVISORY_LIKE_FILE,
        };
        vec![self.record(Edge::table(like.source.clone(), advisory))]
    }

    /// Standalone SELECT: one record per source table.
    pub fn select(&self, body: &str, ctes: &CteMap, config: &LineageConfig) -> Vec<LineageRecord> {
        let sources = gather_sources(body, ctes, config);
        if sources.is_empty() {
            return self.unresolved(ADVISORY_SELECT_NO_SOURCE);
        }
        self.records(
            sources
                .tables()
                .map(|table| Edge::table(Some(table.to_owned()), ADVISORY_SELECT))
                .collect(),
        )
    }

    /// INSERT or CTAS body feeding the destination table.
    ///
    /// Star projections and bodies without a usable select list collapse to
    /// table-level records. Otherwise each item yields one record per origin
    /// token, mapped to `columns` by position when a column list was given.
    pub fn select_into(
        &self,
        body: &str,
        columns: Option<&[String]>,
        ctes: &CteMap,
        config: &LineageConfig,
    ) -> Vec<LineageRecord> {
        let sources = gather_sources(body, ctes, config);
        let raw_items = select_items(body);
        let items: Vec<Option<SelectItem>> = raw_items
            .iter()
            .map(|raw| (!raw.is_empty()).then(|| SelectItem::parse(raw, config)))
            .collect();

        if items.iter().flatten().any(|item| item.is_star) {
            return self.records(table_level_edges(&sources, ADVISORY_STAR));
        }
        if raw_items.is_empty() || (columns.is_none() && raw_items.iter().any(|raw| raw.is_empty()))
        {
            return self.records(table_level_edges(&sources, ADVISORY_NO_COLUMN_LIST));
        }

        let mut edges = vec![];
        for (idx, item) in items.iter().enumerate() {
            let Some(item) = item else {
                continue;
            };
            let (dest_column, advisory) = match columns {
                Some(columns) => (columns.get(idx).cloned(), ADVISORY_BY_POSITION),
                None => (item.output_name().map(str::to_owned), ADVISORY_BY_NAME),
            };
            edges.extend(item_edges(item, dest_column, advisory, &sources));
        }
        if edges.is_empty() {
            return self.records(table_level_edges(&sources, ADVISORY_NO_COLUMN_LIST));
        }

        if config.backfill_single_source {
            backfill(&mut edges, &sources);
        }
        self.records(edges)
    }
}

fn gather_sources(body: &str, ctes: &CteMap, config: &LineageConfig) -> SourceTables {
    let references = CteResolver::new(ctes, config).source_tables(from_clause(body));
    log::debug!("Source tables: {:?}", references);
    SourceTables::new(&references)
}

fn table_level_edges(sources: &SourceTables, advisory: &'static str) -> Vec<Edge> {
    if sources.is_empty() {
        return vec![Edge::table(None, ADVISORY_NO_SOURCE)];
    }
    sources
        .tables()
        .map(|table| Edge::table(Some(table.to_owned()), advisory))
        .collect()
}

fn item_edges(
    item: &SelectItem,
    dest_column: Option<String>,
    advisory: &'static str,
    sources: &SourceTables,
) -> Vec<Edge> {
    if !item.origin_tokens.is_empty() {
        let transform = if item.is_copy() {
            COPY.to_owned()
        } else {
            item.expr.clone()
        };
        return item
            .origin_tokens
            .iter()
            .map(|token| Edge {
                source_table: sources.resolve(token),
                source_column: token.rsplit('.').next().map(str::to_owned),
                dest_column: dest_column.clone(),
                transform: Some(transform.clone()),
                advisory,
            })
            .collect();
    }

    if looks_like_function_call(&item.expr) {
        return vec![Edge {
            source_table: Some(SOURCE_FUNCTIONS.to_owned()),
            source_column: Some(item.expr.clone()),
            dest_column,
            transform: Some(item.expr.clone()),
            advisory: ADVISORY_FUNCTION,
        }];
    }

    vec![Edge {
        dest_column,
        transform: Some(item.expr.clone()),
        advisory,
        ..Default::default()
    }]
}

/// The table an unresolved record falls back to: the statement's only source.
fn fallback_source_table(sources: &SourceTables) -> anyhow::Result<String> {
    if let Some(table) = sources.sole_table() {
        return Ok(table.to_owned());
    }
    match sources.len() {
        0 => Err(anyhow!("no source tables")),
        n => Err(anyhow!("{} distinct source tables", n)),
    }
}

fn backfill(edges: &mut [Edge], sources: &SourceTables) {
    let unresolved = edges
        .iter()
        .filter(|edge| edge.source_table.is_none() && !edge.is_function())
        .count();
    if unresolved == 0 {
        return;
    }
    match fallback_source_table(sources) {
        Ok(table) => {
            for edge in edges.iter_mut().filter(|edge| edge.source_table.is_none()) {
                edge.source_table = Some(table.clone());
            }
        }
        Err(err) => log::info!(
            "Cannot backfill source table of {} record(s): {}",
            unresolved,
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(names: &[&str]) -> SourceTables {
        let references: Vec<_> = names
            .iter()
            .map(|name| crate::clause::TableReference::new(*name, None))
            .collect();
        SourceTables::new(&references)
    }

    #[test]
    fn test_fallback_source_table() {
        assert_eq!(fallback_source_table(&sources(&["s.a"])).unwrap(), "s.a");
        assert_eq!(
            fallback_source_table(&sources(&["s.a", "s.b"]))
                .unwrap_err()
                .to_string(),
            "2 distinct source tables"
        );
        assert!(fallback_source_table(&sources(&[])).is_err());
    }

    #[test]
    fn test_backfill_skips_functions_and_ambiguous_sources() {
        let mut edges = vec![
            Edge::table(None, ADVISORY_BY_NAME),
            Edge::table(Some(SOURCE_FUNCTIONS.to_owned()), ADVISORY_FUNCTION),
        ];
        backfill(&mut edges, &sources(&["s.a", "s.b"]));
        assert_eq!(edges[0].source_table, None);

        backfill(&mut edges, &sources(&["s.a"]));
        assert_eq!(edges[0].source_table.as_deref(), Some("s.a"));
        assert_eq!(edges[1].source_table.as_deref(), Some(SOURCE_FUNCTIONS));
    }

    #[test]
    fn test_item_edges() {
        let config = LineageConfig::default();
        let sources = sources(&["s.a"]);

        let item = SelectItem::parse("upper(x) || y as z", &config);
        let edges = item_edges(&item, Some("z".to_owned()), ADVISORY_BY_NAME, &sources);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].source_column.as_deref(), Some("x"));
        assert_eq!(edges[1].source_column.as_deref(), Some("y"));
        assert_eq!(edges[1].transform.as_deref(), Some("upper(x) || y"));

        let item = SelectItem::parse("current_timestamp()", &config);
        let edges = item_edges(&item, None, ADVISORY_BY_NAME, &sources);
        assert_eq!(edges[0].source_table.as_deref(), Some(SOURCE_FUNCTIONS));
        assert_eq!(edges[0].source_column.as_deref(), Some("current_timestamp()"));

        let item = SelectItem::parse("42", &config);
        let edges = item_edges(&item, Some("n".to_owned()), ADVISORY_BY_POSITION, &sources);
        assert_eq!(edges[0].source_table, None);
        assert_eq!(edges[0].transform.as_deref(), Some("42"));
    }
}
