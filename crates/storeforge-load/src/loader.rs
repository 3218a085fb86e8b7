use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use storeforge_core::{
    ALL_ENTITIES, ConflictPolicy, EntitySchema, ForeignKeySpec, LoadConfig, StagingPaths, entity,
    load_order, validate_entity_schemas,
};

use crate::adapter::Warehouse;
use crate::errors::LoadError;
use crate::reader::{StagedRow, read_staged_file};
use crate::value::CellValue;
use crate::report::{FileReport, FileStatus, LoadReport, RejectedRow};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub batch_size: usize,
    pub on_conflict: ConflictPolicy,
    /// Directory that receives `load_report.json`.
    pub report_dir: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from_config(&LoadConfig::default())
    }
}

impl LoadOptions {
    pub fn from_config(config: &LoadConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            on_conflict: config.on_conflict,
            report_dir: None,
        }
    }
}

/// Keys of a parent table, keyed by the child column that references it.
struct ParentKeys<'s> {
    fk: &'s ForeignKeySpec,
    position: usize,
    keys: HashSet<String>,
}

/// Loads staged files into a warehouse, parents before children.
pub struct Loader<'a> {
    warehouse: &'a dyn Warehouse,
    options: LoadOptions,
}

impl<'a> Loader<'a> {
    pub fn new(warehouse: &'a dyn Warehouse, options: LoadOptions) -> Self {
        Self { warehouse, options }
    }

    /// Load every declared entity found under `staging`.
    ///
    /// Files that fail are recorded in the report and the run continues;
    /// connection failures abort it.
    pub async fn run(&self, staging: &StagingPaths) -> Result<LoadReport, LoadError> {
        let start = Instant::now();
        validate_entity_schemas(ALL_ENTITIES)?;
        let order = load_order(ALL_ENTITIES)?;

        let mut report = LoadReport::new(self.warehouse.engine(), self.options.on_conflict.as_str());
        info!(
            engine = self.warehouse.engine(),
            on_conflict = self.options.on_conflict.as_str(),
            entities = order.len(),
            "load started"
        );

        for schema in order {
            let path = staging.entity_file(schema);
            match self.load_file(schema, &path).await {
                Ok(file) => report.files.push(file),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(entity = schema.name, path = %path.display(), error = %err, "file failed");
                    report.files.push(FileReport::failed(schema.name, &path, &err));
                }
            }
        }

        for schema in ALL_ENTITIES {
            if self.warehouse.table_columns(schema.name).await?.is_some() {
                let count = self.warehouse.count_rows(schema.name).await?;
                report.table_counts.insert(schema.name.to_string(), count);
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            inserted = report.rows_inserted(),
            updated = report.rows_updated(),
            rejected = report.rejected_rows(),
            failed_files = report.failed_files(),
            duration_ms = report.duration_ms,
            "load completed"
        );

        if let Some(dir) = &self.options.report_dir {
            let path = report.write_to(dir)?;
            info!(path = %path.display(), "load report written");
        }
        Ok(report)
    }

    /// Load one staged file into the table for `schema`.
    pub async fn load_file(&self, schema: &EntitySchema, path: &Path) -> Result<FileReport, LoadError> {
        let start = Instant::now();
        if !path.exists() {
            info!(entity = schema.name, path = %path.display(), "no staged file");
            return Ok(FileReport::new(schema.name, path, FileStatus::Missing));
        }

        let rows = read_staged_file(schema, path)?;
        let state = self.warehouse.ensure_table(schema).await?;
        debug!(entity = schema.name, state = ?state, "table ready");

        let key_position = schema
            .primary_key_position()
            .ok_or_else(|| LoadError::mismatch(schema.name, "primary key column not declared"))?;
        let mut parents = Vec::with_capacity(schema.foreign_keys.len());
        for fk in schema.foreign_keys {
            let position = schema
                .position(fk.column)
                .ok_or_else(|| LoadError::mismatch(schema.name, format!("unknown column {}", fk.column)))?;
            parents.push(ParentKeys {
                fk,
                position,
                keys: self.parent_keys(fk).await?,
            });
        }
        let existing = self.warehouse.existing_keys(schema).await?;

        let mut report = FileReport::new(schema.name, path, FileStatus::Loaded);
        report.rows_read = rows.len() as u64;
        let mut seen = HashSet::with_capacity(rows.len());
        let mut accepted = Vec::with_capacity(rows.len());
        let mut updates = 0;

        for row in rows {
            let key = row.values[key_position].key_text().unwrap_or_default();
            if let Err(err) = check_row(schema, &row, &key, &parents) {
                if let LoadError::ConstraintViolation { line, key, message, .. } = err {
                    debug!(entity = schema.name, line, key = %key, reason = %message, "row rejected");
                    report.rejected.push(RejectedRow {
                        line,
                        key,
                        reason: message,
                    });
                }
                continue;
            }
            if !seen.insert(key.clone()) {
                report.duplicates += 1;
                continue;
            }
            if existing.contains(&key) {
                match self.options.on_conflict {
                    ConflictPolicy::Skip => {
                        report.skipped_existing += 1;
                        continue;
                    }
                    ConflictPolicy::Upsert => updates += 1,
                }
            }
            accepted.push(row.values);
        }

        let written = self
            .warehouse
            .insert_rows(schema, &accepted, self.options.on_conflict, self.options.batch_size)
            .await?;
        report.updated = updates;
        report.inserted = written.saturating_sub(updates);
        report.duration_ms = start.elapsed().as_millis() as u64;

        if !report.rejected.is_empty() {
            warn!(
                entity = schema.name,
                rejected = report.rejected.len(),
                "rows rejected"
            );
        }
        info!(
            entity = schema.name,
            rows_read = report.rows_read,
            inserted = report.inserted,
            updated = report.updated,
            skipped_existing = report.skipped_existing,
            duplicates = report.duplicates,
            duration_ms = report.duration_ms,
            "file loaded"
        );
        Ok(report)
    }

    async fn parent_keys(&self, fk: &ForeignKeySpec) -> Result<HashSet<String>, LoadError> {
        let parent = entity(fk.references).ok_or_else(|| {
            LoadError::Schema(storeforge_core::Error::InvalidSchema(format!(
                "unknown entity {}",
                fk.references
            )))
        })?;
        if self.warehouse.table_columns(parent.name).await?.is_none() {
            return Ok(HashSet::new());
        }
        self.warehouse.existing_keys(parent).await
    }
}

fn check_row(
    schema: &EntitySchema,
    row: &StagedRow,
    key: &str,
    parents: &[ParentKeys<'_>],
) -> Result<(), LoadError> {
    let violation = |message: String| LoadError::ConstraintViolation {
        entity: schema.name.to_string(),
        line: row.line,
        key: key.to_string(),
        message,
    };

    for (column, value) in schema.columns.iter().zip(&row.values) {
        if value.is_null() {
            if !column.nullable {
                return Err(violation(format!("{} is required", column.name)));
            }
            continue;
        }
        if let Some(number) = value.as_f64() {
            if !column.bound.admits(number) {
                return Err(violation(format!("{} value {number} is out of bounds", column.name)));
            }
        }
        if let CellValue::Text(Some(text)) = value {
            if !column.admits_text(text) {
                return Err(violation(format!("{} value {text} is not an allowed value", column.name)));
            }
        }
    }

    for parent in parents {
        let Some(value) = row.values[parent.position].key_text() else {
            continue;
        };
        if !parent.keys.contains(&value) {
            return Err(violation(format!(
                "{} {value} not found in {}",
                parent.fk.column, parent.fk.references
            )));
        }
    }
    Ok(())
}
