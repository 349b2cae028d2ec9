use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ddl::{DdlApplier, Side};
use crate::diff::DiffResult;
use crate::error::Result;
use crate::merge::{MergeMode, MergeReport};
use crate::naming::NameMatch;
use crate::table::{Table, TableSummary};

/// Snapshot of one database: its tables, columns and relations.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    name: String,
    /// Redacted connection string the snapshot was loaded from.
    connection: String,
    tables: Vec<Table>,
}

/// Structure summary of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub name: String,
    pub tables: Vec<TableSummary>,
}

impl Schema {
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection: connection.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.table_with(name, NameMatch::CaseInsensitive)
    }

    pub fn table_with(&self, name: &str, matching: NameMatch) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| matching.matches(table.name(), name))
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|table| NameMatch::CaseInsensitive.matches(table.name(), name))
    }

    /// Whether a structurally equal table exists.
    pub fn has_table(&self, table: &Table) -> bool {
        self.tables.iter().any(|candidate| candidate.is_equal(table))
    }

    pub fn is_equal(&self, other: &Schema) -> bool {
        self.tables.len() == other.tables.len()
            && self.tables.iter().all(|table| other.has_table(table))
    }

    /// Table diff of `other` relative to `self`.
    pub fn compare(&self, other: &Schema) -> DiffResult {
        let mut diff = DiffResult::default();

        for table in &other.tables {
            match self.table(table.name()) {
                None => diff.added.push(table.name().to_string()),
                Some(existing) if !existing.is_equal(table) => {
                    diff.updated.push(table.name().to_string())
                }
                Some(_) => {}
            }
        }

        for table in &self.tables {
            if other.table(table.name()).is_none() {
                diff.removed.push(table.name().to_string());
            }
        }

        diff
    }

    /// Create a table with `table`'s columns here. A table with the same name
    /// is left alone.
    pub async fn add_table(
        &mut self,
        table: &Table,
        ddl: &mut DdlApplier<'_>,
        side: Side,
    ) -> Result<()> {
        if self.table(table.name()).is_some() {
            return Ok(());
        }
        let created = Table::new(self.name.as_str(), table.name()).with_columns(table.columns().to_vec());
        created.create(ddl, side).await?;
        self.tables.push(created);
        Ok(())
    }

    /// Drop the table with this name, if present.
    pub async fn remove_table(
        &mut self,
        name: &str,
        ddl: &mut DdlApplier<'_>,
        side: Side,
    ) -> Result<()> {
        let Some(index) = self
            .tables
            .iter()
            .position(|table| NameMatch::CaseInsensitive.matches(table.name(), name))
        else {
            return Ok(());
        };
        self.tables[index].delete(ddl, side).await?;
        self.tables.remove(index);
        Ok(())
    }

    /// Merge `other` into this schema.
    ///
    /// Tables only in `other` are created here. Updated tables are merged
    /// table by table. Tables only here are dropped (`OneWay`) or created in
    /// `other` (`TwoWay`). A second pass then merges every remaining table
    /// again to reconcile relations, now that all referenced tables exist.
    ///
    /// `mode` governs columns and tables only. Relations are always
    /// reconciled `TwoWay`: relations only present in `other` are copied
    /// here, never dropped from `other`.
    ///
    /// Statements are applied one at a time without a transaction; on failure
    /// the error carries the ledger of statements already applied.
    pub async fn merge(
        &mut self,
        other: &mut Schema,
        ddl: &mut DdlApplier<'_>,
        mode: MergeMode,
    ) -> Result<MergeReport> {
        let first_statement = ddl.ledger().len();
        let diff = self.compare(other);

        tracing::info!(
            event = "diff_computed",
            base = %self.name,
            mirror = %other.name,
            added = diff.added.len(),
            updated = diff.updated.len(),
            removed = diff.removed.len()
        );

        for name in &diff.added {
            if let Some(table) = other.table(name).cloned() {
                self.add_table(&table, ddl, Side::Base).await?;
            }
        }

        let mut tables = Vec::with_capacity(diff.updated.len());
        for name in &diff.updated {
            if let (Some(base_table), Some(mirror_table)) =
                (self.table_mut(name), other.table_mut(name))
            {
                tables.push(
                    base_table
                        .merge_with(mirror_table, ddl, mode, MergeMode::TwoWay)
                        .await?,
                );
            }
        }

        for name in &diff.removed {
            match mode {
                MergeMode::OneWay => self.remove_table(name, ddl, Side::Base).await?,
                MergeMode::TwoWay => {
                    if let Some(table) = self.table(name).cloned() {
                        other.add_table(&table, ddl, Side::Mirror).await?;
                    }
                }
            }
        }

        let mut relations = Vec::with_capacity(self.tables.len());
        for base_table in &mut self.tables {
            if let Some(mirror_table) = other.table_mut(base_table.name()) {
                relations.push(
                    base_table
                        .merge_with(mirror_table, ddl, mode, MergeMode::TwoWay)
                        .await?,
                );
            }
        }

        let (added, removed) = mode.report_counts(diff.added.len(), diff.removed.len());
        let ledger = ddl.ledger()[first_statement..].to_vec();

        tracing::info!(
            event = "merge_finished",
            base = %self.name,
            mirror = %other.name,
            added,
            updated = diff.updated.len(),
            removed,
            statements = ledger.len()
        );

        Ok(MergeReport {
            added,
            updated: diff.updated.len(),
            removed,
            tables,
            relations,
            ledger,
        })
    }

    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            name: self.name.clone(),
            tables: self.tables.iter().map(Table::summary).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn schema(name: &str, tables: Vec<Table>) -> Schema {
        Schema::new(name, format!("mysql://localhost/{name}")).with_tables(tables)
    }

    fn table(name: &str, columns: &[&str]) -> Table {
        Table::new("db", name).with_columns(
            columns
                .iter()
                .map(|column| Column::new(*column, "int"))
                .collect(),
        )
    }

    #[test]
    fn compares_tables_by_name() {
        let base = schema("a", vec![table("users", &["id"]), table("legacy", &["id"])]);
        let mirror = schema(
            "b",
            vec![table("users", &["id", "age"]), table("posts", &["id"])],
        );

        let diff = base.compare(&mirror);
        assert_eq!(diff.added, vec!["posts"]);
        assert_eq!(diff.updated, vec!["users"]);
        assert_eq!(diff.removed, vec!["legacy"]);

        let reverse = mirror.compare(&base);
        assert_eq!(reverse.added, diff.removed);
        assert_eq!(reverse.removed, diff.added);
    }

    #[test]
    fn identical_copy_has_no_diff() {
        let base = schema("a", vec![table("users", &["id", "email"])]);
        let copy = schema("b", base.tables().to_vec());
        assert!(base.compare(&copy).is_empty());
        assert!(base.is_equal(&copy));
    }

    #[test]
    fn table_lookup_is_case_insensitive_by_default() {
        let base = schema("a", vec![table("Users", &["id"])]);
        assert!(base.table("users").is_some());
        assert!(base.table_with("users", NameMatch::Exact).is_none());
        assert!(base.table("nope").is_none());
    }

    #[test]
    fn summary_lists_tables_in_order() {
        let base = schema("a", vec![table("b", &["id"]), table("a", &["id"])]);
        let names: Vec<String> = base.summary().tables.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
