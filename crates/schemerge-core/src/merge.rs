use serde::{Deserialize, Serialize};

use crate::ddl::AppliedStatement;

/// Synchronization policy of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Fill gaps on both sides; nothing is dropped.
    #[default]
    TwoWay,
    /// Force the base to match the mirror, dropping what the mirror lacks.
    OneWay,
}

impl MergeMode {
    pub fn is_two_way(self) -> bool {
        self == MergeMode::TwoWay
    }

    /// `(added, removed)` as reported for a diff with `added` and `removed`
    /// entries. Two-way merges copy removed entries across, so they count
    /// as additions and nothing is reported removed.
    pub(crate) fn report_counts(self, added: usize, removed: usize) -> (usize, usize) {
        match self {
            MergeMode::TwoWay => (added + removed, 0),
            MergeMode::OneWay => (added, removed),
        }
    }
}

/// Outcome of merging one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMergeReport {
    pub table: String,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Every statement executed for this table, `"<sql>; \n"` each.
    pub dump_sql: String,
}

/// Outcome of merging two schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Reports of the structural pass over updated tables.
    pub tables: Vec<TableMergeReport>,
    /// Reports of the relation pass over every remaining base table.
    pub relations: Vec<TableMergeReport>,
    /// Statements applied by this merge, in execution order.
    pub ledger: Vec<AppliedStatement>,
}
