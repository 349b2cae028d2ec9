use serde::{Deserialize, Serialize};

use crate::column::Column;

/// Table-level diff of `other` relative to `self`, by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Tables only present in `other`.
    pub added: Vec<String>,
    /// Tables present on both sides but structurally different.
    pub updated: Vec<String>,
    /// Tables only present in `self`.
    pub removed: Vec<String>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Column-level diff of `other` relative to `self`.
///
/// Added and updated columns carry `other`'s definition, removed columns
/// carry `self`'s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDiffResult {
    pub added: Vec<Column>,
    pub updated: Vec<Column>,
    pub removed: Vec<Column>,
}

impl TableDiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    pub fn added_names(&self) -> Vec<&str> {
        column_names(&self.added)
    }

    pub fn updated_names(&self) -> Vec<&str> {
        column_names(&self.updated)
    }

    pub fn removed_names(&self) -> Vec<&str> {
        column_names(&self.removed)
    }
}

fn column_names(columns: &[Column]) -> Vec<&str> {
    columns.iter().map(Column::name).collect()
}
