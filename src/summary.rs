use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::lineage::LineageRecord;

const MAX_EXAMPLE_QUERIES: usize = 3;

/// Records between one source and one destination table, merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEdge {
    pub source_table: String,
    pub dest_table: String,
    pub transforms: Vec<String>,
    pub advisories: Vec<String>,
    pub dest_columns: Vec<String>,
    /// Up to three queries producing this edge.
    pub queries: Vec<String>,
}

#[derive(Default)]
struct EdgeAccumulator {
    transforms: IndexSet<String>,
    advisories: IndexSet<String>,
    dest_columns: IndexSet<String>,
    queries: IndexSet<String>,
}

/// Aggregates records into distinct (source, destination) table edges in
/// first-seen order. Records missing either table are skipped.
pub fn table_edges(records: &[LineageRecord]) -> Vec<TableEdge> {
    let mut edges: IndexMap<(String, String), EdgeAccumulator> = IndexMap::new();

    for record in records {
        let (Some(source), Some(dest)) = (&record.source_table, &record.dest_table) else {
            continue;
        };
        let acc = edges.entry((source.clone(), dest.clone())).or_default();
        if let Some(transform) = &record.transform {
            acc.transforms.insert(transform.clone());
        }
        if let Some(dest_column) = &record.dest_column {
            acc.dest_columns.insert(dest_column.clone());
        }
        acc.advisories.insert(record.advisory.clone());
        if acc.queries.len() < MAX_EXAMPLE_QUERIES {
            acc.queries.insert(record.query.clone());
        }
    }

    edges
        .into_iter()
        .map(|((source_table, dest_table), acc)| TableEdge {
            source_table,
            dest_table,
            transforms: acc.transforms.into_iter().collect(),
            advisories: acc.advisories.into_iter().collect(),
            dest_columns: acc.dest_columns.into_iter().collect(),
            queries: acc.queries.into_iter().collect(),
        })
        .collect()
}
