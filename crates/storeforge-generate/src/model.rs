use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Root of the staging tree; files land in `<staging_root>/raw/internal`.
    pub staging_root: PathBuf,
    /// Directory receiving `generation_report.json`, if any.
    pub report_dir: Option<PathBuf>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from("data"),
            report_dir: None,
        }
    }
}

/// Summary of a generated entity file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub entity: String,
    pub path: PathBuf,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub bytes_written: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub reference_date: NaiveDate,
    pub tables: Vec<TableReport>,
    pub segment_counts: BTreeMap<String, u64>,
    pub category_counts: BTreeMap<String, u64>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, reference_date: NaiveDate) -> Self {
        Self {
            run_id,
            seed,
            reference_date,
            tables: Vec::new(),
            segment_counts: BTreeMap::new(),
            category_counts: BTreeMap::new(),
            bytes_written: 0,
            duration_ms: 0,
        }
    }

    pub fn rows_generated(&self, entity: &str) -> u64 {
        self.tables
            .iter()
            .find(|table| table.entity == entity)
            .map(|table| table.rows_generated)
            .unwrap_or(0)
    }

    pub fn record_table(&mut self, table: TableReport) {
        self.bytes_written = self.bytes_written.saturating_add(table.bytes_written);
        self.tables.push(table);
    }

    pub fn record_segment(&mut self, segment: &str) {
        *self.segment_counts.entry(segment.to_string()).or_insert(0) += 1;
    }

    pub fn record_category(&mut self, category: &str) {
        *self.category_counts.entry(category.to_string()).or_insert(0) += 1;
    }
}
