use thiserror::Error;

/// Errors raised while enriching from external sources.
///
/// `Fetch` and `Config` end the current source; `Parse` is usually folded
/// into a skipped-record count instead of being returned.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unexpected response: {0}")]
    Parse(String),
    #[error("source misconfigured: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
