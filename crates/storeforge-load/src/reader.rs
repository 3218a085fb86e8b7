use std::path::Path;

use storeforge_core::EntitySchema;

use crate::errors::LoadError;
use crate::value::CellValue;

/// One parsed data row and the file line it came from.
#[derive(Debug, Clone)]
pub struct StagedRow {
    pub line: u64,
    pub values: Vec<CellValue>,
}

/// Read a staged file for `schema`.
///
/// The header must list the declared columns in order, and every cell must
/// parse as its column's kind. Either failure rejects the whole file.
pub fn read_staged_file(schema: &EntitySchema, path: &Path) -> Result<Vec<StagedRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let expected = schema.column_names();
    if header != expected {
        return Err(LoadError::mismatch(
            schema.name,
            format!(
                "header [{}] does not match columns [{}]",
                header.join(","),
                expected.join(",")
            ),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let mut values = Vec::with_capacity(schema.columns.len());
        for (column, raw) in schema.columns.iter().zip(record.iter()) {
            let value = CellValue::parse(column.kind, raw).map_err(|message| {
                LoadError::mismatch(schema.name, format!("line {line}, column {}: {message}", column.name))
            })?;
            values.push(value);
        }
        rows.push(StagedRow { line, values });
    }
    Ok(rows)
}
