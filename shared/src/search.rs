//! Client-side name search over the fetched index.

use serde::{Deserialize, Serialize};

use crate::model::IndexEntry;

/// Entries whose name contains `query`, in index order. Case-sensitive; an
/// empty query keeps everything.
pub fn filter_index(entries: &[IndexEntry], query: &str) -> Vec<IndexEntry> {
    entries
        .iter()
        .filter(|entry| entry.name.contains(query))
        .cloned()
        .collect()
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    full_index: Vec<IndexEntry>,
    visible_index: Vec<IndexEntry>,
    query: String,
}

impl SearchState {
    /// Fresh state for a newly fetched index: empty query, everything visible.
    pub fn new(full_index: Vec<IndexEntry>) -> Self {
        Self {
            visible_index: full_index.clone(),
            full_index,
            query: String::new(),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.visible_index = if self.query.is_empty() {
            self.full_index.clone()
        } else {
            filter_index(&self.full_index, &self.query)
        };
    }

    pub fn full_index(&self) -> &[IndexEntry] {
        &self.full_index
    }

    pub fn visible_index(&self) -> &[IndexEntry] {
        &self.visible_index
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// A query was typed and nothing matched it.
    pub fn has_no_results(&self) -> bool {
        !self.query.is_empty() && self.visible_index.is_empty()
    }
}
