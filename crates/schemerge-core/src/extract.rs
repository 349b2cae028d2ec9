//! Relation extraction from `SHOW CREATE TABLE` text.
//!
//! The scanner is positional: every line is split on the identifier quote
//! and classified by how many segments it produces. Five segments describe
//! a single-column index, nine a single-column foreign-key constraint.
//! Lines whose leading segment mentions `PRIMARY` are skipped.
//!
//! [`ScannedDdl`] is the only thing the rest of the crate consumes, so a
//! catalog-based source can replace the text scanner by producing the same
//! tuples.

use crate::error::{Error, Result};
use crate::relation::{Relation, RelationType};

const IDENT_QUOTE: char = '`';
const KEY_SEGMENTS: usize = 5;
const CONSTRAINT_SEGMENTS: usize = 9;

/// An index declared in the creation DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTuple {
    pub key_name: String,
    pub field_name: String,
    pub is_unique: bool,
}

/// A foreign-key constraint declared in the creation DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTuple {
    pub constraint_name: String,
    pub field_name: String,
    pub ref_table_name: String,
    pub ref_table_key: String,
    pub extra: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedDdl {
    pub keys: Vec<KeyTuple>,
    pub constraints: Vec<ConstraintTuple>,
}

/// Scan creation DDL into key and constraint tuples.
///
/// Empty text yields no tuples. Text that is not a `CREATE TABLE` statement,
/// or a foreign-key line that does not have the single-column shape, is an
/// [`Error::Extraction`].
pub fn scan_create_table(table: &str, ddl: &str) -> Result<ScannedDdl> {
    let mut scanned = ScannedDdl::default();

    let Some(first_line) = ddl.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return Ok(scanned);
    };
    if !first_line.to_uppercase().starts_with("CREATE TABLE") {
        return Err(extraction_error(
            table,
            first_line,
            "not a CREATE TABLE statement",
        ));
    }

    for line in ddl.lines() {
        let segments: Vec<&str> = line.split(IDENT_QUOTE).collect();
        if segments[0].contains("PRIMARY") {
            continue;
        }

        match segments.len() {
            KEY_SEGMENTS => scanned.keys.push(KeyTuple {
                key_name: segments[1].to_string(),
                field_name: segments[3].to_string(),
                is_unique: segments[0].contains("UNIQUE"),
            }),
            CONSTRAINT_SEGMENTS => scanned.constraints.push(ConstraintTuple {
                constraint_name: segments[1].to_string(),
                field_name: segments[3].to_string(),
                ref_table_name: segments[5].to_string(),
                ref_table_key: segments[7].to_string(),
                extra: trailing_clause(segments[8]),
            }),
            _ if declares_foreign_key(segments[0]) => {
                return Err(extraction_error(
                    table,
                    line.trim(),
                    "only single-column foreign keys can be extracted",
                ));
            }
            _ => {}
        }
    }

    Ok(scanned)
}

/// Pair every constraint with the first index on the same field.
///
/// A unique index makes the relation `OneToOne` and names its key; anything
/// else is `ManyToOne` without a key.
pub fn resolve_relations(table: &str, scanned: &ScannedDdl) -> Vec<Relation> {
    scanned
        .constraints
        .iter()
        .map(|constraint| {
            let key = scanned
                .keys
                .iter()
                .find(|key| key.field_name == constraint.field_name);

            let (relation_type, key_name) = match key {
                Some(key) if key.is_unique => (RelationType::OneToOne, key.key_name.as_str()),
                _ => (RelationType::ManyToOne, ""),
            };

            Relation::new(
                table,
                relation_type,
                constraint.field_name.as_str(),
                constraint.constraint_name.as_str(),
                constraint.ref_table_name.as_str(),
                constraint.ref_table_key.as_str(),
            )
            .with_key_name(key_name)
            .with_extra(constraint.extra.as_str())
        })
        .collect()
}

/// Scan and resolve in one step.
pub fn extract_relations(table: &str, ddl: &str) -> Result<Vec<Relation>> {
    let scanned = scan_create_table(table, ddl)?;
    Ok(resolve_relations(table, &scanned))
}

// `) ON DELETE CASCADE,` -> `ON DELETE CASCADE`
fn trailing_clause(segment: &str) -> String {
    let segment = segment.trim_start();
    let segment = segment.strip_prefix(')').unwrap_or(segment);
    segment.replace(',', "").trim().to_string()
}

// Constraint lines start with the keyword; column lines start with the
// quoted column name, so comments and defaults never reach this check.
fn declares_foreign_key(first_segment: &str) -> bool {
    let head = first_segment.trim_start().to_uppercase();
    head.starts_with("CONSTRAINT") || head.starts_with("FOREIGN KEY")
}

fn extraction_error(table: &str, line: &str, reason: &str) -> Error {
    Error::Extraction {
        table: table.to_string(),
        line: line.to_string(),
        reason: reason.to_string(),
    }
}
