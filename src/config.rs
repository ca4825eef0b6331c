use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::lineage::functions::is_reserved_word;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LineageConfig {
    /// Upper bound on nested CTE and derived-table expansion.
    pub max_expansion_depth: usize,
    /// Words discarded on top of the built-in reserved words.
    pub extra_reserved_words: Vec<String>,
    /// Fill unresolved source tables when a statement reads exactly one table.
    pub backfill_single_source: bool,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: default_max_expansion_depth(),
            extra_reserved_words: vec![],
            backfill_single_source: true,
        }
    }
}

fn default_max_expansion_depth() -> usize {
    32
}

impl LineageConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let mut config: LineageConfig =
            toml::from_str(config_str).context("Failed to parse config file")?;
        for word in &mut config.extra_reserved_words {
            *word = word.trim().to_lowercase();
        }
        Ok(config)
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        is_reserved_word(word) || self.extra_reserved_words.iter().any(|w| w == word)
    }
}
