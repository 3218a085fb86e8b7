use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use storeforge_core::{WeatherObservation, WeatherSourceConfig};

use super::{
    ExternalSource, RequestTally, SourceOutcome, f64_field, slug, stage, str_field, synthetic,
};
use crate::errors::EnrichError;
use crate::http::Fetcher;

const SOURCE: &str = "openweathermap";

/// Current conditions per city from an OpenWeatherMap-compatible endpoint.
pub struct WeatherSource {
    config: WeatherSourceConfig,
}

impl WeatherSource {
    pub fn new(config: WeatherSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExternalSource for WeatherSource {
    fn name(&self) -> &'static str {
        "weather"
    }

    async fn run(&self, fetcher: &mut Fetcher, out_dir: &Path) -> Result<SourceOutcome, EnrichError> {
        let now = Utc::now().naive_utc();
        let Some(api_key) = self.config.api_key.as_deref() else {
            if self.config.synthetic_fallback {
                warn!(source = self.name(), "no api key, emitting synthetic observations");
                let records = synthetic::weather(&mut rand::rng(), &self.config.cities, now);
                return stage(out_dir, &records, 0, true);
            }
            return Err(EnrichError::Config(
                "weather api key missing (OPENWEATHER_API_KEY)".to_string(),
            ));
        };

        let mut records = Vec::with_capacity(self.config.cities.len());
        let mut tally = RequestTally::new();
        for city in &self.config.cities {
            let response = fetcher
                .get_json(
                    &self.config.endpoint,
                    &[("q", city.as_str()), ("appid", api_key), ("units", "metric")],
                )
                .await;
            let Some(body) = tally.settle(self.name(), city, response) else {
                continue;
            };
            match parse_observation(city, &body, now) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(source = self.name(), city = %city, error = %err, "skipping observation");
                    tally.skip(1);
                }
            }
        }

        info!(
            source = self.name(),
            records = records.len(),
            skipped = tally.skipped(),
            requests_failed = tally.failed(),
            "weather fetched"
        );
        tally.finish(out_dir, &records)
    }
}

/// Map one current-weather document to an observation.
///
/// The observation time comes from `dt` when present, else `fetched_at`.
pub fn parse_observation(
    city: &str,
    body: &Value,
    fetched_at: NaiveDateTime,
) -> Result<WeatherObservation, EnrichError> {
    let temperature_c = f64_field(body, "/main/temp")?;
    let humidity = f64_field(body, "/main/humidity")?.round() as i64;
    if !(0..=100).contains(&humidity) {
        return Err(EnrichError::Parse(format!("humidity out of range: {humidity}")));
    }
    let condition = str_field(body, "/weather/0/main")?.to_string();
    let observed_at = body
        .get("dt")
        .and_then(Value::as_i64)
        .and_then(|dt| DateTime::from_timestamp(dt, 0))
        .map(|dt| dt.naive_utc())
        .unwrap_or(fetched_at);

    Ok(WeatherObservation {
        observation_id: format!("{}:{}", slug(city), observed_at.format("%Y%m%dT%H%M%S")),
        city: city.to_string(),
        observed_at,
        temperature_c,
        humidity,
        condition,
        source: SOURCE.to_string(),
    })
}
