use serde_json::{Map, Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _};

use schemerge_core::{DescribedColumn, Row};

use super::queries::RawColumn;

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<DescribedColumn> {
    raw.into_iter()
        .map(|col| DescribedColumn {
            name: col.name,
            raw_type: col.column_type,
            null_marker: col.is_nullable,
            key_marker: col.column_key,
            default_value: col.default,
            extra: col.extra,
        })
        .collect()
}

/// Convert a result row into a JSON object keyed by column label.
pub fn map_row(row: &MySqlRow) -> Row {
    let mut object = Map::new();
    for column in row.columns() {
        object.insert(column.name().to_string(), cell_value(row, column.ordinal()));
    }
    object
}

// Decoders are tried from the most to the least specific; a type mismatch
// falls through to the next one.
fn cell_value(row: &MySqlRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map_or(Value::Null, Value::String);
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value.map_or(Value::Null, |bytes| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        });
    }
    Value::Null
}
