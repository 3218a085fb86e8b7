use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use storeforge_core::EnrichConfig;

use crate::errors::EnrichError;
use crate::http::Fetcher;
use crate::report::{EnrichReport, SourceReport, SourceStatus};
use crate::sources::{CompetitorSource, EconomicSource, ExternalSource, SocialSource, WeatherSource};

/// Runs every configured source in turn.
pub struct Enricher<'a> {
    config: &'a EnrichConfig,
}

impl<'a> Enricher<'a> {
    pub fn new(config: &'a EnrichConfig) -> Self {
        Self { config }
    }

    /// Sources in run order, paired with whether they are enabled.
    fn sources(&self) -> Vec<(Box<dyn ExternalSource>, bool)> {
        let config = self.config;
        vec![
            (
                Box::new(WeatherSource::new(config.weather.clone())) as Box<dyn ExternalSource>,
                config.weather.enabled,
            ),
            (
                Box::new(EconomicSource::new(config.economic.clone())),
                config.economic.enabled,
            ),
            (
                Box::new(SocialSource::new(config.social.clone())),
                config.social.enabled,
            ),
            (
                Box::new(CompetitorSource::new(config.competitor.clone())),
                config.competitor.enabled,
            ),
        ]
    }

    /// Stage every enabled source into `out_dir`.
    ///
    /// Source failures are recorded in the report; only failing to create
    /// `out_dir` is returned as an error.
    pub async fn run(&self, out_dir: &Path) -> Result<EnrichReport, EnrichError> {
        let start = Instant::now();
        std::fs::create_dir_all(out_dir)?;

        let mut report = EnrichReport::default();
        for (source, enabled) in self.sources() {
            let name = source.name();
            if !enabled {
                info!(source = name, "source disabled");
                report.sources.push(SourceReport {
                    source: name.to_string(),
                    status: SourceStatus::Skipped,
                    records_written: 0,
                    records_skipped: 0,
                    requests_failed: 0,
                    path: None,
                    message: Some("disabled".to_string()),
                    synthetic: false,
                });
                continue;
            }

            report.sources.push(run_source(source.as_ref(), &self.config.request, out_dir).await);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            sources = report.sources.len(),
            failed = report.failed(),
            records_written = report.records_written(),
            duration_ms = report.duration_ms,
            "enrichment completed"
        );
        Ok(report)
    }
}

async fn run_source(
    source: &dyn ExternalSource,
    policy: &storeforge_core::RequestPolicy,
    out_dir: &Path,
) -> SourceReport {
    let name = source.name();
    let source_start = Instant::now();
    info!(source = name, "source started");

    let outcome = match Fetcher::new(policy) {
        Ok(mut fetcher) => source.run(&mut fetcher, out_dir).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(outcome) => {
            info!(
                source = name,
                records_written = outcome.records_written,
                records_skipped = outcome.records_skipped,
                requests_failed = outcome.requests_failed,
                synthetic = outcome.synthetic,
                duration_ms = source_start.elapsed().as_millis() as u64,
                "source finished"
            );
            let message = (outcome.requests_failed > 0)
                .then(|| format!("{} request(s) failed", outcome.requests_failed));
            SourceReport {
                source: name.to_string(),
                status: SourceStatus::Ok,
                records_written: outcome.records_written,
                records_skipped: outcome.records_skipped,
                requests_failed: outcome.requests_failed,
                path: Some(outcome.path),
                message,
                synthetic: outcome.synthetic,
            }
        }
        Err(err) => {
            warn!(source = name, error = %err, "source failed");
            SourceReport {
                source: name.to_string(),
                status: SourceStatus::Failed,
                records_written: 0,
                records_skipped: 0,
                requests_failed: 0,
                path: None,
                message: Some(err.to_string()),
                synthetic: false,
            }
        }
    }
}
