use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::EntitySchema;

/// Validate internal consistency of a set of entity declarations.
///
/// This checks:
/// - duplicate table, file and column names
/// - primary key columns exist and are required
/// - foreign key columns and referenced targets exist
/// - index columns exist
pub fn validate_entity_schemas(entities: &[&EntitySchema]) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut files = BTreeSet::new();

    for schema in entities {
        if catalog.contains_key(schema.name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                schema.name
            )));
        }
        if !files.insert(schema.file_name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate file name: {}",
                schema.file_name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in schema.columns {
            if !columns.insert(column.name) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    schema.name, column.name
                )));
            }
        }
        catalog.insert(schema.name, columns);
    }

    for schema in entities {
        match schema.column(schema.primary_key) {
            Some(column) if !column.nullable => {}
            Some(_) => {
                return Err(Error::InvalidSchema(format!(
                    "primary key column is nullable: {}.{}",
                    schema.name, schema.primary_key
                )));
            }
            None => {
                return Err(Error::InvalidSchema(format!(
                    "primary key column not found: {}.{}",
                    schema.name, schema.primary_key
                )));
            }
        }

        for fk in schema.foreign_keys {
            if schema.column(fk.column).is_none() {
                return Err(Error::InvalidSchema(format!(
                    "foreign key column not found: {}.{}",
                    schema.name, fk.column
                )));
            }

            let ref_columns = catalog.get(fk.references).ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "referenced table not found: {} (from {}.{})",
                    fk.references, schema.name, fk.column
                ))
            })?;
            if !ref_columns.contains(fk.referenced_column) {
                return Err(Error::InvalidSchema(format!(
                    "referenced column not found: {}.{}",
                    fk.references, fk.referenced_column
                )));
            }
        }

        for index in schema.indexes {
            for column in index.columns {
                if schema.column(column).is_none() {
                    return Err(Error::InvalidSchema(format!(
                        "index column not found: {}.{} ({})",
                        schema.name, column, index.name
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ALL_ENTITIES, ColumnKind, ColumnSpec, ForeignKeySpec, StagingArea};

    static ORPHAN: EntitySchema = EntitySchema {
        name: "returns",
        file_name: "returns.csv",
        area: StagingArea::Internal,
        columns: &[
            ColumnSpec::required("return_id", ColumnKind::Text),
            ColumnSpec::required("order_id", ColumnKind::Text),
        ],
        primary_key: "return_id",
        foreign_keys: &[ForeignKeySpec {
            column: "order_id",
            references: "orders",
            referenced_column: "order_id",
        }],
        indexes: &[],
    };

    static NULLABLE_KEY: EntitySchema = EntitySchema {
        name: "notes",
        file_name: "notes.csv",
        area: StagingArea::External,
        columns: &[ColumnSpec::nullable("note_id", ColumnKind::Text)],
        primary_key: "note_id",
        foreign_keys: &[],
        indexes: &[],
    };

    #[test]
    fn declared_entities_are_consistent() {
        validate_entity_schemas(ALL_ENTITIES).expect("declared entities validate");
    }

    #[test]
    fn rejects_missing_reference_target() {
        let err = validate_entity_schemas(&[&ORPHAN]).expect_err("missing target");
        assert!(err.to_string().contains("referenced table not found: orders"));
    }

    #[test]
    fn rejects_nullable_primary_key() {
        let err = validate_entity_schemas(&[&NULLABLE_KEY]).expect_err("nullable pk");
        assert!(err.to_string().contains("nullable"));
    }
}
