//! Evolution lineage trees and their flattened display order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Deepest lineage accepted from the gateway. Real chains are at most a
/// handful of levels.
pub const MAX_LINEAGE_DEPTH: usize = 32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LineageNode {
    pub species_name: String,
    #[serde(default)]
    pub children: Vec<LineageNode>,
}

impl LineageNode {
    pub fn leaf(species_name: impl Into<String>) -> Self {
        Self {
            species_name: species_name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(species_name: impl Into<String>, children: Vec<LineageNode>) -> Self {
        Self {
            species_name: species_name.into(),
            children,
        }
    }

    pub fn flatten(&self) -> Vec<String> {
        flatten(self)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineageError {
    #[error("species '{species}' appears more than once in the lineage")]
    RepeatedSpecies { species: String },

    #[error("lineage deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Pre-order, depth-first: the node, then each child's flattening in child
/// order.
pub fn flatten(root: &LineageNode) -> Vec<String> {
    let mut names = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        names.push(node.species_name.clone());
        // reversed so the first child is popped first
        stack.extend(node.children.iter().rev());
    }

    names
}

/// Same order as [`flatten`], but rejects trees that repeat a species or
/// nest past [`MAX_LINEAGE_DEPTH`].
pub fn try_flatten(root: &LineageNode) -> Result<Vec<String>, LineageError> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![(root, 0_usize)];

    while let Some((node, depth)) = stack.pop() {
        if depth >= MAX_LINEAGE_DEPTH {
            return Err(LineageError::TooDeep {
                max: MAX_LINEAGE_DEPTH,
            });
        }

        if !seen.insert(node.species_name.as_str()) {
            return Err(LineageError::RepeatedSpecies {
                species: node.species_name.clone(),
            });
        }

        names.push(node.species_name.clone());
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    Ok(names)
}
