use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::executor::DescribedColumn;

/// Normalized column type family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    String,
    /// Any type outside the known families, kept verbatim.
    Other(String),
}

impl ColumnType {
    /// Classify a raw database type. First match wins, so `tinyint(1)` is
    /// checked before the generic `int` family.
    pub fn from_raw(raw_type: &str) -> Self {
        let lowered = raw_type.to_lowercase();
        if lowered.contains("tinyint(1)") {
            ColumnType::Bool
        } else if lowered.contains("int") {
            ColumnType::Int
        } else if lowered.contains("float") || lowered.contains("double") {
            ColumnType::Float
        } else if lowered.contains("char") || lowered.contains("text") {
            ColumnType::String
        } else {
            ColumnType::Other(raw_type.to_string())
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Bool => f.write_str("bool"),
            ColumnType::Int => f.write_str("int"),
            ColumnType::Float => f.write_str("float"),
            ColumnType::String => f.write_str("string"),
            ColumnType::Other(raw) => f.write_str(raw),
        }
    }
}

/// A single column definition.
///
/// Built once from introspected metadata, or through the `with_*` builders
/// when describing a column that should exist.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    name: String,
    raw_type: String,
    nullable: bool,
    default_value: Option<String>,
    primary_key: bool,
    unique_key: bool,
    foreign_key: bool,
    auto_increment: bool,
}

impl Column {
    /// A `NOT NULL` column with no default and no key.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            nullable: false,
            default_value: None,
            primary_key: false,
            unique_key: false,
            foreign_key: false,
            auto_increment: false,
        }
    }

    pub fn from_described(described: DescribedColumn) -> Self {
        Self {
            nullable: described.null_marker.eq_ignore_ascii_case("YES"),
            default_value: normalize_default(described.default_value),
            primary_key: described.key_marker.eq_ignore_ascii_case("PRI"),
            unique_key: described.key_marker.eq_ignore_ascii_case("UNI"),
            foreign_key: described.key_marker.eq_ignore_ascii_case("MUL"),
            auto_increment: described.extra.to_lowercase().contains("auto_increment"),
            name: described.name,
            raw_type: described.raw_type,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = normalize_default(Some(default_value.into()));
        self
    }

    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn with_unique_key(mut self, unique_key: bool) -> Self {
        self.unique_key = unique_key;
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: bool) -> Self {
        self.foreign_key = foreign_key;
        self
    }

    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_raw(&self.raw_type)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_unique_key(&self) -> bool {
        self.unique_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Structural equality used by the diff. Foreign-key status and the
    /// unique flag are not compared.
    pub fn is_equal(&self, other: &Column) -> bool {
        self.name == other.name
            && self.column_type() == other.column_type()
            && self.nullable == other.nullable
            && self.default_value == other.default_value
            && self.primary_key == other.primary_key
            && self.auto_increment == other.auto_increment
    }

    /// Column definition as used in `CREATE TABLE` and `ALTER TABLE`.
    ///
    /// Clause order is fixed: nullability, default, `UNIQUE`, `PRIMARY KEY`,
    /// `AUTO_INCREMENT`. Defaults are rendered verbatim, except that a
    /// string-family default not already starting with `'` is single-quoted
    /// (with embedded quotes doubled).
    pub fn metadata(&self) -> String {
        let mut sql = format!(
            "{} {} {}",
            self.name,
            self.raw_type,
            if self.nullable { "NULL" } else { "NOT NULL" }
        );
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if self.unique_key {
            sql.push_str(" UNIQUE");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }

    // DESCRIBE reports string defaults unquoted.
    fn render_default(&self, default: &str) -> String {
        if self.column_type() == ColumnType::String && !default.starts_with('\'') {
            format!("'{}'", default.replace('\'', "''"))
        } else {
            default.to_string()
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\": \"{}\"", self.name, self.column_type())
    }
}

fn normalize_default(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn described(name: &str, raw_type: &str, null: &str, key: &str, extra: &str) -> DescribedColumn {
        DescribedColumn {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            null_marker: null.to_string(),
            key_marker: key.to_string(),
            default_value: None,
            extra: extra.to_string(),
        }
    }

    #[test]
    fn classifies_types_by_precedence() {
        assert_eq!(ColumnType::from_raw("tinyint(1)"), ColumnType::Bool);
        assert_eq!(ColumnType::from_raw("tinyint(4)"), ColumnType::Int);
        assert_eq!(ColumnType::from_raw("bigint unsigned"), ColumnType::Int);
        assert_eq!(ColumnType::from_raw("INT"), ColumnType::Int);
        assert_eq!(ColumnType::from_raw("double(8,2)"), ColumnType::Float);
        assert_eq!(ColumnType::from_raw("float"), ColumnType::Float);
        assert_eq!(ColumnType::from_raw("varchar(255)"), ColumnType::String);
        assert_eq!(ColumnType::from_raw("longtext"), ColumnType::String);
        assert_eq!(
            ColumnType::from_raw("datetime"),
            ColumnType::Other("datetime".to_string())
        );
        assert_eq!(ColumnType::from_raw("datetime").to_string(), "datetime");
    }

    #[test]
    fn reads_describe_markers() {
        let id = Column::from_described(described("id", "int", "NO", "PRI", "auto_increment"));
        assert!(id.is_primary_key());
        assert!(id.is_auto_increment());
        assert!(!id.is_nullable());

        let dept = Column::from_described(described("dept_id", "int", "YES", "MUL", ""));
        assert!(dept.is_foreign_key());
        assert!(dept.is_nullable());
        assert!(!dept.is_unique_key());
    }

    #[test]
    fn empty_default_means_no_default() {
        let mut raw = described("name", "varchar(20)", "YES", "", "");
        raw.default_value = Some(String::new());
        let column = Column::from_described(raw);
        assert_eq!(column.default_value(), None);
        assert!(column.is_equal(&Column::new("name", "varchar(20)").with_nullable(true)));
    }

    #[test]
    fn renders_minimal_metadata() {
        let age = Column::new("age", "INT").with_nullable(true);
        assert_eq!(age.metadata(), "age INT NULL");
    }

    #[test]
    fn renders_clauses_in_fixed_order() {
        let id = Column::new("id", "int")
            .with_default("0")
            .with_unique_key(true)
            .with_primary_key(true)
            .with_auto_increment(true);
        assert_eq!(
            id.metadata(),
            "id int NOT NULL DEFAULT 0 UNIQUE PRIMARY KEY AUTO_INCREMENT"
        );

        let status = Column::new("status", "varchar(16)").with_default("new");
        assert_eq!(status.metadata(), "status varchar(16) NOT NULL DEFAULT 'new'");
    }

    #[test]
    fn equality_ignores_foreign_key_status() {
        let plain = Column::new("dept_id", "int").with_nullable(true);
        let referenced = plain.clone().with_foreign_key(true);
        assert!(plain.is_equal(&referenced));
        assert!(referenced.is_equal(&plain));
        assert!(plain.is_equal(&plain));
    }

    #[test]
    fn string_defaults_are_quoted_once() {
        let quoted = Column::new("label", "varchar(16)").with_default("'draft'");
        assert_eq!(quoted.metadata(), "label varchar(16) NOT NULL DEFAULT 'draft'");

        let apostrophe = Column::new("label", "varchar(16)").with_default("it's");
        assert_eq!(apostrophe.metadata(), "label varchar(16) NOT NULL DEFAULT 'it''s'");

        let timestamp = Column::new("created_at", "datetime").with_default("CURRENT_TIMESTAMP");
        assert_eq!(
            timestamp.metadata(),
            "created_at datetime NOT NULL DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn equality_ignores_unique_flag() {
        let plain = Column::new("email", "varchar(255)");
        let unique = plain.clone().with_unique_key(true);
        assert!(plain.is_equal(&unique));
        assert!(!plain.is_equal(&plain.clone().with_primary_key(true)));
    }

    #[test]
    fn equality_compares_normalized_type() {
        let narrow = Column::new("name", "varchar(20)");
        let wide = Column::new("name", "varchar(255)");
        let number = Column::new("name", "int");
        assert!(narrow.is_equal(&wide));
        assert!(!narrow.is_equal(&number));
        assert!(!narrow.is_equal(&narrow.clone().with_nullable(true)));
        assert!(!narrow.is_equal(&narrow.clone().with_default("x")));
    }

    #[test]
    fn displays_name_and_type() {
        let column = Column::new("email", "varchar(255)");
        assert_eq!(column.to_string(), "\"email\": \"string\"");
    }
}
