use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::ddl::{DdlApplier, Side, dump_line};
use crate::diff::TableDiffResult;
use crate::error::Result;
use crate::merge::{MergeMode, TableMergeReport};
use crate::naming::NameMatch;
use crate::relation::Relation;

/// Columns and relations of one table.
///
/// A table is a snapshot: nothing here re-reads the database. During a merge
/// the snapshot is updated in step with each statement that succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    name: String,
    /// Name of the owning schema.
    schema: String,
    /// Physical column order.
    columns: Vec<Column>,
    relations: Vec<Relation>,
    /// Creation DDL the relations were extracted from.
    #[serde(default)]
    creation_script: String,
}

/// Name and `column -> type` pairs of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: BTreeMap<String, String>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
            relations: Vec::new(),
            creation_script: String::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_creation_script(mut self, creation_script: impl Into<String>) -> Self {
        self.creation_script = creation_script.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// The raw creation DDL, as returned by the database.
    pub fn creation_script(&self) -> &str {
        &self.creation_script
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_with(name, NameMatch::CaseInsensitive)
    }

    pub fn column_with(&self, name: &str, matching: NameMatch) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| matching.matches(column.name(), name))
    }

    /// Whether a structurally equal column exists.
    pub fn has_column(&self, column: &Column) -> bool {
        self.columns.iter().any(|candidate| candidate.is_equal(column))
    }

    pub fn relation_by_constraint_name(&self, constraint_name: &str) -> Option<&Relation> {
        self.relation_by_constraint_name_with(constraint_name, NameMatch::CaseInsensitive)
    }

    pub fn relation_by_constraint_name_with(
        &self,
        constraint_name: &str,
        matching: NameMatch,
    ) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| matching.matches(relation.constraint_name(), constraint_name))
    }

    pub fn relation_by_field_name(&self, field_name: &str) -> Option<&Relation> {
        self.relation_by_field_name_with(field_name, NameMatch::CaseInsensitive)
    }

    pub fn relation_by_field_name_with(
        &self,
        field_name: &str,
        matching: NameMatch,
    ) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| matching.matches(relation.field_name(), field_name))
    }

    fn relation_index(&self, constraint_name: &str) -> Option<usize> {
        self.relations.iter().position(|relation| {
            NameMatch::CaseInsensitive.matches(relation.constraint_name(), constraint_name)
        })
    }

    /// Same name, same column count, and every column of `other` has a
    /// structurally equal column here. Relations are not compared.
    pub fn is_equal(&self, other: &Table) -> bool {
        self.name == other.name
            && self.columns.len() == other.columns.len()
            && other.columns.iter().all(|column| self.has_column(column))
    }

    /// Column diff of `other` relative to `self`.
    pub fn compare(&self, other: &Table) -> TableDiffResult {
        let mut diff = TableDiffResult::default();

        for column in &other.columns {
            match self.column(column.name()) {
                None => diff.added.push(column.clone()),
                Some(existing) if !existing.is_equal(column) => diff.updated.push(column.clone()),
                Some(_) => {}
            }
        }

        for column in &self.columns {
            if other.column(column.name()).is_none() {
                diff.removed.push(column.clone());
            }
        }

        diff
    }

    pub fn create_statement(&self) -> String {
        let definitions: Vec<String> = self.columns.iter().map(Column::metadata).collect();
        format!("CREATE TABLE {} ({})", self.name, definitions.join(", "))
    }

    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE {}", self.name)
    }

    pub async fn create(&self, ddl: &mut DdlApplier<'_>, side: Side) -> Result<()> {
        ddl.apply(side, self.create_statement()).await
    }

    pub async fn delete(&self, ddl: &mut DdlApplier<'_>, side: Side) -> Result<()> {
        ddl.apply(side, self.drop_statement()).await
    }

    /// Create a copy of `relation` on this table.
    pub async fn add_relation(
        &mut self,
        relation: &Relation,
        ddl: &mut DdlApplier<'_>,
        side: Side,
    ) -> Result<()> {
        let relation = relation.for_table(&self.name);
        relation.create(ddl, side).await?;
        self.relations.push(relation);
        Ok(())
    }

    /// Drop the relation with this constraint name, if present.
    pub async fn remove_relation(
        &mut self,
        constraint_name: &str,
        ddl: &mut DdlApplier<'_>,
        side: Side,
    ) -> Result<()> {
        if let Some(index) = self.relation_index(constraint_name) {
            self.relations[index].remove(ddl, side).await?;
            self.relations.remove(index);
        }
        Ok(())
    }

    /// Merge `other` into this table.
    ///
    /// Updated and added columns are applied here. Columns only present here
    /// are dropped (`OneWay`) or added to `other` (`TwoWay`). Relations are
    /// then reconciled by constraint name, see [`Table::merge_relations`].
    pub async fn merge(
        &mut self,
        other: &mut Table,
        ddl: &mut DdlApplier<'_>,
        mode: MergeMode,
    ) -> Result<TableMergeReport> {
        self.merge_with(other, ddl, mode, mode).await
    }

    /// [`Table::merge`] with separate modes for the column phase and the
    /// relation phase.
    pub async fn merge_with(
        &mut self,
        other: &mut Table,
        ddl: &mut DdlApplier<'_>,
        mode: MergeMode,
        relation_mode: MergeMode,
    ) -> Result<TableMergeReport> {
        let first_statement = ddl.ledger().len();
        let diff = self.compare(other);

        for column in &diff.updated {
            let sql = format!(
                "ALTER TABLE {} CHANGE COLUMN {} {}",
                self.name,
                column.name(),
                column.metadata()
            );
            ddl.apply(Side::Base, sql).await?;
            if let Some(slot) = self
                .columns
                .iter_mut()
                .find(|existing| NameMatch::CaseInsensitive.matches(existing.name(), column.name()))
            {
                *slot = column.clone();
            }
        }

        for column in &diff.added {
            let sql = format!("ALTER TABLE {} ADD COLUMN {}", self.name, column.metadata());
            ddl.apply(Side::Base, sql).await?;
            self.columns.push(column.clone());
        }

        for column in &diff.removed {
            match mode {
                MergeMode::OneWay => {
                    let sql = format!("ALTER TABLE {} DROP COLUMN {}", self.name, column.name());
                    ddl.apply(Side::Base, sql).await?;
                    self.columns
                        .retain(|existing| existing.name() != column.name());
                }
                MergeMode::TwoWay => {
                    let sql = format!("ALTER TABLE {} ADD COLUMN {}", self.name, column.metadata());
                    ddl.apply(Side::Mirror, sql).await?;
                    other.columns.push(column.clone());
                }
            }
        }

        self.merge_relations(other, ddl, relation_mode).await?;

        let (added, removed) = mode.report_counts(diff.added.len(), diff.removed.len());
        let dump_sql = ddl.ledger()[first_statement..]
            .iter()
            .map(|applied| dump_line(&applied.statement))
            .collect();

        tracing::debug!(
            event = "table_merged",
            table = %self.name,
            added,
            updated = diff.updated.len(),
            removed
        );

        Ok(TableMergeReport {
            table: self.name.clone(),
            added,
            updated: diff.updated.len(),
            removed,
            dump_sql,
        })
    }

    /// Reconcile relations by constraint name.
    ///
    /// Every relation here is pushed to `other`: missing ones are created, a
    /// same-target relation that only differs by key name gets its key
    /// renamed, any other difference is replaced. Relations only present in
    /// `other` are copied here (`TwoWay`) or dropped from `other` (`OneWay`).
    pub async fn merge_relations(
        &mut self,
        other: &mut Table,
        ddl: &mut DdlApplier<'_>,
        mode: MergeMode,
    ) -> Result<()> {
        let base_relations = self.relations.clone();
        for relation in &base_relations {
            let Some(index) = other.relation_index(relation.constraint_name()) else {
                other.add_relation(relation, ddl, Side::Mirror).await?;
                continue;
            };
            if other.relations[index].is_equal(relation) {
                continue;
            }

            let renamed = other.relations[index].differs_only_by_key(relation)
                && other.relations[index]
                    .update_key(relation.key_name(), ddl, Side::Mirror)
                    .await?;
            if !renamed {
                other.relations[index].remove(ddl, Side::Mirror).await?;
                other.relations.remove(index);
                other.add_relation(relation, ddl, Side::Mirror).await?;
            }
        }

        let mirror_relations = other.relations.clone();
        for relation in &mirror_relations {
            if self.relation_index(relation.constraint_name()).is_some() {
                continue;
            }
            match mode {
                MergeMode::TwoWay => self.add_relation(relation, ddl, Side::Base).await?,
                MergeMode::OneWay => {
                    other
                        .remove_relation(relation.constraint_name(), ddl, Side::Mirror)
                        .await?
                }
            }
        }

        Ok(())
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| (column.name().to_string(), column.column_type().to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationType;

    fn users() -> Table {
        Table::new("app", "users").with_columns(vec![
            Column::new("id", "int")
                .with_primary_key(true)
                .with_auto_increment(true),
            Column::new("email", "varchar(255)").with_unique_key(true),
            Column::new("name", "varchar(64)").with_nullable(true),
        ])
    }

    #[test]
    fn compares_columns_by_name() {
        let base = users();
        let mut columns = users().columns().to_vec();
        columns.remove(2);
        columns[1] = Column::new("email", "varchar(255)").with_nullable(true);
        columns.push(Column::new("age", "INT").with_nullable(true));
        let mirror = Table::new("app", "users").with_columns(columns);

        let diff = base.compare(&mirror);
        assert_eq!(diff.added_names(), vec!["age"]);
        assert_eq!(diff.updated_names(), vec!["email"]);
        assert_eq!(diff.removed_names(), vec!["name"]);

        let reverse = mirror.compare(&base);
        assert_eq!(reverse.added_names(), diff.removed_names());
        assert_eq!(reverse.removed_names(), diff.added_names());
    }

    #[test]
    fn identical_tables_have_empty_diff() {
        assert!(users().compare(&users()).is_empty());
        assert!(users().is_equal(&users()));
    }

    #[test]
    fn equality_needs_same_name_and_width() {
        let renamed = Table::new("app", "people").with_columns(users().columns().to_vec());
        assert!(!users().is_equal(&renamed));

        let mut wider = users().columns().to_vec();
        wider.push(Column::new("age", "int"));
        let wider = Table::new("app", "users").with_columns(wider);
        assert!(!users().is_equal(&wider));
    }

    #[test]
    fn renders_create_and_drop() {
        let table = Table::new("app", "tag").with_columns(vec![
            Column::new("id", "int").with_primary_key(true),
            Column::new("label", "varchar(32)").with_nullable(true),
        ]);
        assert_eq!(
            table.create_statement(),
            "CREATE TABLE tag (id int NOT NULL PRIMARY KEY, label varchar(32) NULL)"
        );
        assert_eq!(table.drop_statement(), "DROP TABLE tag");
    }

    #[test]
    fn lookups_are_case_insensitive_unless_exact() {
        let table = users().with_relations(vec![Relation::new(
            "users",
            RelationType::ManyToOne,
            "dept_id",
            "fk_user_dept",
            "department",
            "id",
        )]);
        assert!(table.column("EMAIL").is_some());
        assert!(table.column_with("EMAIL", NameMatch::Exact).is_none());
        assert!(table.column("missing").is_none());
        assert!(table.relation_by_constraint_name("FK_USER_DEPT").is_some());
        assert!(
            table
                .relation_by_constraint_name_with("FK_USER_DEPT", NameMatch::Exact)
                .is_none()
        );
        assert!(table.relation_by_field_name("dept_id").is_some());
    }

    #[test]
    fn summarizes_normalized_types() {
        let summary = users().summary();
        assert_eq!(summary.name, "users");
        assert_eq!(summary.columns.get("id").map(String::as_str), Some("int"));
        assert_eq!(summary.columns.get("email").map(String::as_str), Some("string"));
    }
}
