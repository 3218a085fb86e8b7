use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Failed,
    Skipped,
}

/// Outcome of one external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub status: SourceStatus,
    pub records_written: u64,
    /// Records dropped because their payload could not be parsed.
    pub records_skipped: u64,
    /// Requests that failed outright while others in the source succeeded.
    #[serde(default)]
    pub requests_failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// True when the records were synthesized instead of fetched.
    #[serde(default)]
    pub synthetic: bool,
}

/// Report for an enrichment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichReport {
    pub sources: Vec<SourceReport>,
    pub duration_ms: u64,
}

impl EnrichReport {
    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|source| source.source == name)
    }

    pub fn failed(&self) -> usize {
        self.sources
            .iter()
            .filter(|source| source.status == SourceStatus::Failed)
            .count()
    }

    pub fn records_written(&self) -> u64 {
        self.sources.iter().map(|source| source.records_written).sum()
    }
}
