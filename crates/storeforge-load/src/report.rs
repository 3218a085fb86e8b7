use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::LoadError;

pub const REPORT_FILE: &str = "load_report.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Loaded,
    Failed,
    /// No staged file for the entity; nothing was attempted.
    Missing,
}

/// A row that failed a constraint check and was not written.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub line: u64,
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub entity: String,
    pub path: PathBuf,
    pub status: FileStatus,
    pub rows_read: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped_existing: u64,
    pub duplicates: u64,
    pub rejected: Vec<RejectedRow>,
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl FileReport {
    pub fn new(entity: &str, path: &Path, status: FileStatus) -> Self {
        Self {
            entity: entity.to_string(),
            path: path.to_path_buf(),
            status,
            rows_read: 0,
            inserted: 0,
            updated: 0,
            skipped_existing: 0,
            duplicates: 0,
            rejected: Vec::new(),
            message: None,
            duration_ms: 0,
        }
    }

    pub fn failed(entity: &str, path: &Path, err: &LoadError) -> Self {
        let mut report = Self::new(entity, path, FileStatus::Failed);
        report.message = Some(err.to_string());
        report
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub engine: String,
    pub on_conflict: String,
    pub files: Vec<FileReport>,
    /// Row count of every warehouse table after the load.
    pub table_counts: BTreeMap<String, u64>,
    pub duration_ms: u64,
}

impl LoadReport {
    pub fn new(engine: &str, on_conflict: &str) -> Self {
        Self {
            engine: engine.to_string(),
            on_conflict: on_conflict.to_string(),
            files: Vec::new(),
            table_counts: BTreeMap::new(),
            duration_ms: 0,
        }
    }

    pub fn file(&self, entity: &str) -> Option<&FileReport> {
        self.files.iter().find(|file| file.entity == entity)
    }

    pub fn failed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|file| file.status == FileStatus::Failed)
            .count()
    }

    pub fn rejected_rows(&self) -> usize {
        self.files.iter().map(|file| file.rejected.len()).sum()
    }

    pub fn rows_inserted(&self) -> u64 {
        self.files.iter().map(|file| file.inserted).sum()
    }

    pub fn rows_updated(&self) -> u64 {
        self.files.iter().map(|file| file.updated).sum()
    }

    /// Whether the run counts as successful. Strict runs also fail on
    /// rejected rows.
    pub fn is_success(&self, strict: bool) -> bool {
        if !strict {
            return true;
        }
        self.failed_files() == 0 && self.rejected_rows() == 0
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, LoadError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }
}
