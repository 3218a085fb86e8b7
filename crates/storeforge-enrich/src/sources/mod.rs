use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use storeforge_core::{Record, write_records_csv};

use crate::errors::EnrichError;
use crate::http::Fetcher;

pub mod competitor;
pub mod economic;
pub mod social;
pub mod synthetic;
pub mod weather;

pub use competitor::CompetitorSource;
pub use economic::EconomicSource;
pub use social::SocialSource;
pub use weather::WeatherSource;

/// What a source staged.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub path: PathBuf,
    pub records_written: u64,
    pub records_skipped: u64,
    /// Requests that never produced a usable response.
    pub requests_failed: u64,
    pub synthetic: bool,
}

/// A third-party dataset that can be fetched and staged as one CSV file.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch, normalize and write this source's file into `out_dir`.
    async fn run(&self, fetcher: &mut Fetcher, out_dir: &Path)
    -> Result<SourceOutcome, EnrichError>;
}

pub(crate) fn stage<R: Record>(
    out_dir: &Path,
    records: &[R],
    records_skipped: u64,
    synthetic: bool,
) -> Result<SourceOutcome, EnrichError> {
    let path = out_dir.join(R::schema().file_name);
    write_records_csv(&path, records)?;
    Ok(SourceOutcome {
        path,
        records_written: records.len() as u64,
        records_skipped,
        requests_failed: 0,
        synthetic,
    })
}

/// Per-request bookkeeping for a source's fetch loop.
///
/// A response body that cannot be decoded counts as a skipped record; any
/// other error counts as a failed request. The source fails only when every
/// request it made failed.
#[derive(Debug, Default)]
pub(crate) struct RequestTally {
    attempted: u64,
    failed: u64,
    skipped: u64,
    last_failure: Option<EnrichError>,
}

impl RequestTally {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Settle one request, returning its payload when it produced one.
    pub(crate) fn settle<T>(
        &mut self,
        source: &str,
        request: &str,
        result: Result<T, EnrichError>,
    ) -> Option<T> {
        self.attempted += 1;
        match result {
            Ok(payload) => Some(payload),
            Err(EnrichError::Parse(message)) => {
                warn!(source, request, error = %message, "skipping undecodable response");
                self.skipped += 1;
                None
            }
            Err(err) => {
                warn!(source, request, error = %err, "request failed");
                self.failed += 1;
                self.last_failure = Some(err);
                None
            }
        }
    }

    pub(crate) fn skip(&mut self, records: u64) {
        self.skipped += records;
    }

    pub(crate) fn skipped(&self) -> u64 {
        self.skipped
    }

    pub(crate) fn failed(&self) -> u64 {
        self.failed
    }

    /// Stage what was fetched, or return the last failure when nothing got through.
    pub(crate) fn finish<R: Record>(
        self,
        out_dir: &Path,
        records: &[R],
    ) -> Result<SourceOutcome, EnrichError> {
        if self.failed > 0 && self.failed == self.attempted {
            if let Some(err) = self.last_failure {
                return Err(err);
            }
        }
        let mut outcome = stage(out_dir, records, self.skipped, false)?;
        outcome.requests_failed = self.failed;
        Ok(outcome)
    }
}

/// Lowercase, dash-separated identifier fragment.
pub(crate) fn slug(value: &str) -> String {
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub(crate) fn field<'v>(value: &'v Value, pointer: &str) -> Result<&'v Value, EnrichError> {
    value
        .pointer(pointer)
        .ok_or_else(|| EnrichError::Parse(format!("missing field {pointer}")))
}

pub(crate) fn f64_field(value: &Value, pointer: &str) -> Result<f64, EnrichError> {
    field(value, pointer)?
        .as_f64()
        .ok_or_else(|| EnrichError::Parse(format!("{pointer} is not a number")))
}

pub(crate) fn str_field<'v>(value: &'v Value, pointer: &str) -> Result<&'v str, EnrichError> {
    field(value, pointer)?
        .as_str()
        .ok_or_else(|| EnrichError::Parse(format!("{pointer} is not a string")))
}
