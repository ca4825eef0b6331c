use std::fmt::Display;

use serde::Deserialize;

use crate::{config::LineageConfig, lineage::LineageRecord};

pub const LINEAGE_TESTS_FILE: &str = "tests/lineage_tests.toml";

/// Expected record of a fixture. Omitted fields are expected to be null.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub source_table: Option<String>,
    pub dest_table: Option<String>,
    pub source_column: Option<String>,
    pub dest_column: Option<String>,
    pub transform: Option<String>,
}

impl From<&LineageRecord> for TestRecord {
    fn from(record: &LineageRecord) -> Self {
        Self {
            source_table: record.source_table.clone(),
            dest_table: record.dest_table.clone(),
            source_column: record.source_column.clone(),
            dest_column: record.dest_column.clone(),
            transform: record.transform.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestLineage {
    pub name: String,
    pub sql: String,
    /// Settings for this case; defaults when omitted.
    pub config: Option<LineageConfig>,
    pub records: Vec<TestRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestLineageData {
    pub tests: Vec<TestLineage>,
}

impl Display for TestLineageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
