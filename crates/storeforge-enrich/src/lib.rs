//! External data enrichment for storeforge.
//!
//! Each configured source (weather, economic indicators, social mentions,
//! competitor listings) is fetched sequentially through a rate-limited
//! [`Fetcher`], normalized into records and staged as CSV under
//! `raw/external/`. A failing source is reported and the others continue.

pub mod engine;
pub mod errors;
pub mod http;
pub mod report;
pub mod sources;

pub use engine::Enricher;
pub use errors::EnrichError;
pub use http::Fetcher;
pub use report::{EnrichReport, SourceReport, SourceStatus};
pub use sources::{ExternalSource, SourceOutcome};
