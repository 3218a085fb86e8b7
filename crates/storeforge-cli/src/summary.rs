//! End-of-run summaries printed to stdout and persisted as JSON.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use storeforge_enrich::{EnrichReport, SourceStatus};
use storeforge_generate::GenerationReport;
use storeforge_load::{FileStatus, LoadReport};

pub const PIPELINE_SUMMARY_FILE: &str = "pipeline_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub status: SourceStatus,
    pub records: u64,
    pub records_skipped: u64,
    pub requests_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a generate run, including enrichment when it ran.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub run_id: String,
    pub seed: u64,
    pub reference_date: NaiveDate,
    pub generated: BTreeMap<String, u64>,
    pub segments: BTreeMap<String, u64>,
    pub enrichment: Option<BTreeMap<String, SourceSummary>>,
    pub duration_ms: u64,
}

impl PipelineSummary {
    pub fn new(
        run_id: &str,
        generation: &GenerationReport,
        enrichment: Option<&EnrichReport>,
        duration_ms: u64,
    ) -> Self {
        let generated = generation
            .tables
            .iter()
            .map(|table| (table.entity.clone(), table.rows_generated))
            .collect();
        let enrichment = enrichment.map(|report| {
            report
                .sources
                .iter()
                .map(|source| {
                    (
                        source.source.clone(),
                        SourceSummary {
                            status: source.status,
                            records: source.records_written,
                            records_skipped: source.records_skipped,
                            requests_failed: source.requests_failed,
                            message: source.message.clone(),
                        },
                    )
                })
                .collect()
        });

        Self {
            run_id: run_id.to_string(),
            seed: generation.seed,
            reference_date: generation.reference_date,
            generated,
            segments: generation.segment_counts.clone(),
            enrichment,
            duration_ms,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "run {} (seed {}, reference date {})", self.run_id, self.seed, self.reference_date);
        let _ = writeln!(out, "generated:");
        for (entity, rows) in &self.generated {
            let _ = writeln!(out, "  {entity:<24} {rows:>8}");
        }
        match &self.enrichment {
            Some(sources) => {
                let _ = writeln!(out, "fetched:");
                for (name, source) in sources {
                    let status = match source.status {
                        SourceStatus::Ok => "ok",
                        SourceStatus::Failed => "failed",
                        SourceStatus::Skipped => "skipped",
                    };
                    let _ = write!(out, "  {name:<24} {:>8} {status}", source.records);
                    if source.records_skipped > 0 {
                        let _ = write!(out, ", {} skipped", source.records_skipped);
                    }
                    if source.requests_failed > 0 {
                        let _ = write!(out, ", {} failed requests", source.requests_failed);
                    }
                    if source.status == SourceStatus::Failed {
                        if let Some(message) = &source.message {
                            let _ = write!(out, " ({message})");
                        }
                    }
                    out.push('\n');
                }
            }
            None => {
                let _ = writeln!(out, "fetched: skipped");
            }
        }
        out
    }
}

/// Text table for a load run.
pub fn render_load(report: &LoadReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "load into {} (on conflict: {})", report.engine, report.on_conflict);
    let _ = writeln!(
        out,
        "  {:<24} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}  status",
        "entity", "read", "inserted", "updated", "skipped", "dups", "rejected"
    );
    for file in &report.files {
        let status = match file.status {
            FileStatus::Loaded => "loaded".to_string(),
            FileStatus::Missing => "missing".to_string(),
            FileStatus::Failed => format!("failed: {}", file.message.as_deref().unwrap_or_default()),
        };
        let _ = writeln!(
            out,
            "  {:<24} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}  {status}",
            file.entity,
            file.rows_read,
            file.inserted,
            file.updated,
            file.skipped_existing,
            file.duplicates,
            file.rejected.len()
        );
    }
    let _ = writeln!(out, "tables:");
    for (table, rows) in &report.table_counts {
        let _ = writeln!(out, "  {table:<24} {rows:>8}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use storeforge_enrich::SourceReport;
    use storeforge_generate::TableReport;
    use storeforge_load::{FileReport, RejectedRow};

    use super::*;

    fn generation() -> GenerationReport {
        let mut report = GenerationReport::new(
            "run-1".to_string(),
            42,
            NaiveDate::from_ymd_opt(2024, 6, 30).expect("date"),
        );
        report.record_table(TableReport {
            entity: "customers".to_string(),
            path: "data/raw/internal/customers.csv".into(),
            rows_requested: 100,
            rows_generated: 100,
            bytes_written: 1024,
        });
        report
    }

    #[test]
    fn pipeline_summary_lists_failed_sources() {
        let enrich = EnrichReport {
            sources: vec![SourceReport {
                source: "economic".to_string(),
                status: SourceStatus::Failed,
                records_written: 0,
                records_skipped: 0,
                requests_failed: 0,
                path: None,
                message: Some("fetch failed: timeout".to_string()),
                synthetic: false,
            }],
            duration_ms: 5,
        };
        let summary = PipelineSummary::new("run-1", &generation(), Some(&enrich), 10);

        assert_eq!(summary.generated.get("customers"), Some(&100));
        let text = summary.render();
        assert!(text.contains("customers"));
        assert!(text.contains("failed (fetch failed: timeout)"));
    }

    #[test]
    fn pipeline_summary_separates_skips_from_failed_requests() {
        let enrich = EnrichReport {
            sources: vec![SourceReport {
                source: "weather".to_string(),
                status: SourceStatus::Ok,
                records_written: 2,
                records_skipped: 1,
                requests_failed: 1,
                path: Some("data/raw/external/weather_observations.csv".into()),
                message: Some("1 request(s) failed".to_string()),
                synthetic: false,
            }],
            duration_ms: 5,
        };
        let summary = PipelineSummary::new("run-1", &generation(), Some(&enrich), 10);

        let text = summary.render();
        assert!(text.contains("ok, 1 skipped, 1 failed requests"));
        let weather = summary
            .enrichment
            .as_ref()
            .and_then(|sources| sources.get("weather"))
            .expect("weather summary");
        assert_eq!(weather.requests_failed, 1);
        assert_eq!(weather.records_skipped, 1);
    }

    #[test]
    fn load_table_shows_rejections() {
        let mut report = LoadReport::new("sqlite", "skip");
        let mut file = FileReport::new("transactions", Path::new("t.csv"), FileStatus::Loaded);
        file.rows_read = 3;
        file.inserted = 2;
        file.rejected.push(RejectedRow {
            line: 4,
            key: "TXN_00000003".to_string(),
            reason: "customer_id CUST_X not found in customers".to_string(),
        });
        report.files.push(file);
        report.table_counts.insert("transactions".to_string(), 2);

        let text = render_load(&report);
        assert!(text.contains("load into sqlite (on conflict: skip)"));
        assert!(text.lines().any(|line| line.trim_start().starts_with("transactions")
            && line.trim_end().ends_with("loaded")));
    }
}
