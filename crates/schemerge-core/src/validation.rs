use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::Schema;

/// Validate internal consistency of a schema snapshot.
///
/// This checks:
/// - duplicate table names
/// - duplicate column names per table
/// - duplicate constraint names per table
/// - relations on columns the table does not have
pub fn validate_schema(schema: &Schema) -> Result<()> {
    let mut tables = BTreeSet::new();

    for table in schema.tables() {
        if !tables.insert(table.name()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}.{}",
                schema.name(),
                table.name()
            )));
        }

        let mut columns = BTreeSet::new();
        for column in table.columns() {
            if !columns.insert(column.name()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}.{}",
                    schema.name(),
                    table.name(),
                    column.name()
                )));
            }
        }

        let mut constraints = BTreeSet::new();
        for relation in table.relations() {
            if !constraints.insert(relation.constraint_name()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate constraint name: {}.{}.{}",
                    schema.name(),
                    table.name(),
                    relation.constraint_name()
                )));
            }

            if !columns.contains(relation.field_name()) {
                return Err(Error::InvalidSchema(format!(
                    "relation column not found: {}.{}.{} ({})",
                    schema.name(),
                    table.name(),
                    relation.field_name(),
                    relation.constraint_name()
                )));
            }
        }
    }

    Ok(())
}
