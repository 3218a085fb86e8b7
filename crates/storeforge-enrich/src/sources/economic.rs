use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta, Utc};
use serde_json::Value;
use tracing::{info, warn};

use storeforge_core::values::parse_date_value;
use storeforge_core::{EconomicIndicator, EconomicSourceConfig};

use super::{ExternalSource, RequestTally, SourceOutcome, field, stage, str_field, synthetic};
use crate::errors::EnrichError;
use crate::http::Fetcher;

const SOURCE: &str = "fred";

/// Daily series observations from a FRED-compatible endpoint.
pub struct EconomicSource {
    config: EconomicSourceConfig,
}

impl EconomicSource {
    pub fn new(config: EconomicSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExternalSource for EconomicSource {
    fn name(&self) -> &'static str {
        "economic"
    }

    async fn run(&self, fetcher: &mut Fetcher, out_dir: &Path) -> Result<SourceOutcome, EnrichError> {
        let today = Utc::now().date_naive();
        let Some(api_key) = self.config.api_key.as_deref() else {
            if self.config.synthetic_fallback {
                warn!(source = self.name(), "no api key, emitting synthetic indicators");
                let records = synthetic::economic(&mut rand::rng(), &self.config.series, today);
                return stage(out_dir, &records, 0, true);
            }
            return Err(EnrichError::Config(
                "economic api key missing (FRED_API_KEY)".to_string(),
            ));
        };

        let start = (today - TimeDelta::days(i64::from(self.config.lookback_days))).to_string();
        let mut records = Vec::new();
        let mut tally = RequestTally::new();
        for series_id in &self.config.series {
            let response = fetcher
                .get_json(
                    &self.config.endpoint,
                    &[
                        ("series_id", series_id.as_str()),
                        ("api_key", api_key),
                        ("file_type", "json"),
                        ("observation_start", start.as_str()),
                    ],
                )
                .await;
            let Some(body) = tally.settle(self.name(), series_id, response) else {
                continue;
            };
            let parsed = match parse_observations(series_id, &body) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(source = self.name(), series = %series_id, error = %err, "skipping series");
                    tally.skip(1);
                    continue;
                }
            };
            if parsed.skipped > 0 {
                warn!(
                    source = self.name(),
                    series = %series_id,
                    skipped = parsed.skipped,
                    "skipped unparseable observations"
                );
            }
            tally.skip(parsed.skipped);
            records.extend(parsed.records);
        }

        info!(
            source = self.name(),
            records = records.len(),
            skipped = tally.skipped(),
            requests_failed = tally.failed(),
            "indicators fetched"
        );
        tally.finish(out_dir, &records)
    }
}

#[derive(Debug, Default)]
pub struct ParsedObservations {
    pub records: Vec<EconomicIndicator>,
    pub skipped: u64,
}

/// Map an observations document to indicator records.
///
/// Entries with a missing value (`"."`) or a malformed date are skipped; a
/// document without an `observations` array is rejected whole.
pub fn parse_observations(series_id: &str, body: &Value) -> Result<ParsedObservations, EnrichError> {
    let observations = field(body, "/observations")?
        .as_array()
        .ok_or_else(|| EnrichError::Parse("/observations is not an array".to_string()))?;

    let mut parsed = ParsedObservations::default();
    for observation in observations {
        match parse_entry(series_id, observation) {
            Ok(record) => parsed.records.push(record),
            Err(_) => parsed.skipped += 1,
        }
    }
    Ok(parsed)
}

fn parse_entry(series_id: &str, observation: &Value) -> Result<EconomicIndicator, EnrichError> {
    let date = str_field(observation, "/date")?;
    let observation_date: NaiveDate = parse_date_value(date)
        .ok_or_else(|| EnrichError::Parse(format!("invalid date {date}")))?;
    let raw = str_field(observation, "/value")?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| EnrichError::Parse(format!("invalid value {raw:?}")))?;

    Ok(EconomicIndicator {
        indicator_id: format!("{series_id}:{observation_date}"),
        series_id: series_id.to_string(),
        observation_date,
        value,
        source: SOURCE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn skips_missing_values() {
        let body = json!({
            "observations": [
                {"date": "2024-01-01", "value": "3.7"},
                {"date": "2024-02-01", "value": "."},
                {"date": "not-a-date", "value": "3.9"}
            ]
        });
        let parsed = parse_observations("UNRATE", &body).expect("parse");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.records[0].indicator_id, "UNRATE:2024-01-01");
        assert_eq!(parsed.records[0].value, 3.7);
    }

    #[test]
    fn rejects_document_without_observations() {
        let body = json!({"error_code": 400, "error_message": "Bad Request"});
        assert!(matches!(
            parse_observations("UNRATE", &body),
            Err(EnrichError::Parse(_))
        ));
    }
}
