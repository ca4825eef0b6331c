use indexmap::{IndexMap, IndexSet};

use crate::clause::TableReference;

/// Lookup tables built from the physical sources of one statement.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    /// Alias -> table. An alias shared by several tables maps to the last one.
    by_alias: IndexMap<String, String>,
    /// Last path segment -> table. The first table with a given base name wins.
    by_base_name: IndexMap<String, String>,
    tables: IndexSet<String>,
}

impl SourceTables {
    pub fn new(references: &[TableReference]) -> Self {
        let mut sources = Self::default();
        for reference in references {
            if let Some(alias) = &reference.alias {
                sources
                    .by_alias
                    .insert(alias.clone(), reference.name.clone());
            }
            let base_name = reference
                .name
                .rsplit('.')
                .next()
                .unwrap_or(&reference.name);
            sources
                .by_base_name
                .entry(base_name.to_owned())
                .or_insert_with(|| reference.name.clone());
            sources.tables.insert(reference.name.clone());
        }
        sources
    }

    /// Distinct tables in first-seen order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The only distinct table, if there is exactly one.
    pub fn sole_table(&self) -> Option<&str> {
        match self.tables.len() {
            1 => self.tables.first().map(String::as_str),
            _ => None,
        }
    }

    /// Maps a `col`, `t.col` or `s.t.col` token to the table it reads from.
    ///
    /// Qualified tokens try their prefix as an alias, then as a literal
    /// `schema.table`, then as a base name. Bare tokens try alias and base
    /// name. Both fall back to the sole source table.
    pub fn resolve(&self, token: &str) -> Option<String> {
        if token == "*" {
            return None;
        }

        let segments: Vec<&str> = token.split('.').collect();
        let resolved = match segments.as_slice() {
            [single] => self
                .by_alias
                .get(*single)
                .or_else(|| self.by_base_name.get(*single))
                .cloned(),
            [first, second, ..] => {
                let qualified = format!("{}.{}", first, second);
                self.by_alias
                    .get(*first)
                    .cloned()
                    .or_else(|| self.tables.get(&qualified).cloned())
                    .or_else(|| self.by_base_name.get(*first).cloned())
            }
            [] => None,
        };

        resolved.or_else(|| self.sole_table().map(str::to_owned))
    }
}
