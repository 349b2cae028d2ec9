use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ddl::{DdlApplier, Side};
use crate::error::Result;

/// Cardinality of a relation.
///
/// Extraction only ever produces `OneToOne` and `ManyToOne`; the other two
/// are reserved for manually declared relations and render no DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationType {
    /// Whether the relation is backed by a foreign key on the owning table.
    pub fn has_foreign_key(self) -> bool {
        matches!(self, RelationType::OneToOne | RelationType::ManyToOne)
    }
}

/// One foreign-key relation of a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    /// Name of the owning table.
    table: String,
    relation_type: RelationType,
    field_name: String,
    /// Backing unique/primary index, empty when there is none.
    key_name: String,
    constraint_name: String,
    ref_table_name: String,
    ref_table_key: String,
    /// Trailing clause such as `ON DELETE CASCADE`.
    extra: String,
}

impl Relation {
    pub fn new(
        table: impl Into<String>,
        relation_type: RelationType,
        field_name: impl Into<String>,
        constraint_name: impl Into<String>,
        ref_table_name: impl Into<String>,
        ref_table_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            relation_type,
            field_name: field_name.into(),
            key_name: String::new(),
            constraint_name: constraint_name.into(),
            ref_table_name: ref_table_name.into(),
            ref_table_key: ref_table_key.into(),
            extra: String::new(),
        }
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into().trim().to_string();
        self
    }

    /// Copy of this relation owned by another table.
    pub fn for_table(&self, table: &str) -> Relation {
        Relation {
            table: table.to_string(),
            ..self.clone()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn constraint_name(&self) -> &str {
        &self.constraint_name
    }

    pub fn ref_table_name(&self) -> &str {
        &self.ref_table_name
    }

    pub fn ref_table_key(&self) -> &str {
        &self.ref_table_key
    }

    pub fn extra(&self) -> &str {
        &self.extra
    }

    /// Structural equality; the relation type is not compared.
    pub fn is_equal(&self, other: &Relation) -> bool {
        self.field_name == other.field_name
            && self.key_name == other.key_name
            && self.constraint_name == other.constraint_name
            && self.ref_table_name == other.ref_table_name
            && self.ref_table_key == other.ref_table_key
            && self.extra == other.extra
    }

    /// Both relations reference the same table and key.
    pub fn same_target(&self, other: &Relation) -> bool {
        self.ref_table_name == other.ref_table_name && self.ref_table_key == other.ref_table_key
    }

    /// The relations are equal except for the backing key name.
    pub fn differs_only_by_key(&self, other: &Relation) -> bool {
        self.key_name != other.key_name
            && self.field_name == other.field_name
            && self.constraint_name == other.constraint_name
            && self.same_target(other)
            && self.extra == other.extra
    }

    pub fn create_statement(&self) -> Option<String> {
        if !self.relation_type.has_foreign_key() {
            return None;
        }
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT `{}` FOREIGN KEY (`{}`) REFERENCES `{}` (`{}`)",
            self.table,
            self.constraint_name,
            self.field_name,
            self.ref_table_name,
            self.ref_table_key
        );
        if !self.extra.is_empty() {
            sql.push(' ');
            sql.push_str(&self.extra);
        }
        Some(sql)
    }

    pub fn remove_statement(&self) -> Option<String> {
        self.relation_type.has_foreign_key().then(|| {
            format!(
                "ALTER TABLE {} DROP FOREIGN KEY `{}`",
                self.table, self.constraint_name
            )
        })
    }

    /// `None` when there is no backing key to rename.
    pub fn rename_key_statement(&self, new_key_name: &str) -> Option<String> {
        (!self.key_name.is_empty()).then(|| {
            format!(
                "ALTER TABLE {} RENAME KEY `{}` TO `{}`",
                self.table, self.key_name, new_key_name
            )
        })
    }

    pub async fn create(&self, ddl: &mut DdlApplier<'_>, side: Side) -> Result<()> {
        match self.create_statement() {
            Some(sql) => ddl.apply(side, sql).await,
            None => Ok(()),
        }
    }

    pub async fn remove(&self, ddl: &mut DdlApplier<'_>, side: Side) -> Result<()> {
        match self.remove_statement() {
            Some(sql) => ddl.apply(side, sql).await,
            None => Ok(()),
        }
    }

    /// Rename the backing key. Returns `false` without touching the
    /// database when the relation has no key.
    pub async fn update_key(
        &mut self,
        new_key_name: &str,
        ddl: &mut DdlApplier<'_>,
        side: Side,
    ) -> Result<bool> {
        let Some(sql) = self.rename_key_statement(new_key_name) else {
            return Ok(false);
        };
        ddl.apply(side, sql).await?;
        self.key_name = new_key_name.to_string();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept_relation() -> Relation {
        Relation::new(
            "users",
            RelationType::ManyToOne,
            "dept_id",
            "fk_user_dept",
            "department",
            "id",
        )
    }

    #[test]
    fn renders_foreign_key_statements() {
        let relation = dept_relation().with_extra(" ON DELETE CASCADE");
        assert_eq!(
            relation.create_statement().as_deref(),
            Some(
                "ALTER TABLE users ADD CONSTRAINT `fk_user_dept` FOREIGN KEY (`dept_id`) REFERENCES `department` (`id`) ON DELETE CASCADE"
            )
        );
        assert_eq!(
            relation.remove_statement().as_deref(),
            Some("ALTER TABLE users DROP FOREIGN KEY `fk_user_dept`")
        );
    }

    #[test]
    fn reserved_types_render_nothing() {
        let relation = Relation::new("users", RelationType::OneToMany, "id", "c", "posts", "user_id");
        assert_eq!(relation.create_statement(), None);
        assert_eq!(relation.remove_statement(), None);
    }

    #[test]
    fn key_rename_requires_a_key() {
        assert_eq!(dept_relation().rename_key_statement("uk_dept"), None);
        let keyed = dept_relation().with_key_name("uk_old");
        assert_eq!(
            keyed.rename_key_statement("uk_new").as_deref(),
            Some("ALTER TABLE users RENAME KEY `uk_old` TO `uk_new`")
        );
    }

    #[test]
    fn equality_ignores_relation_type() {
        let many = dept_relation();
        let mut one = dept_relation();
        one.relation_type = RelationType::OneToOne;
        assert!(many.is_equal(&one));
        assert!(!many.is_equal(&dept_relation().with_extra("ON DELETE CASCADE")));
        assert!(!many.is_equal(&dept_relation().with_key_name("k")));
    }

    #[test]
    fn detects_key_only_differences() {
        let keyed = dept_relation().with_key_name("uk_a");
        let renamed = dept_relation().with_key_name("uk_b");
        assert!(keyed.differs_only_by_key(&renamed));
        assert!(!keyed.differs_only_by_key(&keyed));
        assert!(!keyed.differs_only_by_key(&renamed.clone().with_extra("ON DELETE CASCADE")));
    }

    #[test]
    fn moves_to_another_owner() {
        let relation = dept_relation().for_table("staff");
        assert_eq!(relation.table(), "staff");
        assert_eq!(relation.constraint_name(), "fk_user_dept");
    }
}
