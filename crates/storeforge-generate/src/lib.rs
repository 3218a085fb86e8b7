//! Synthetic record generation for storeforge.
//!
//! Produces customers, products and transactions from a [`GenerateConfig`]
//! and stages them as CSV files under `raw/internal/`. Seeded runs are
//! byte-for-byte reproducible.
//!
//! [`GenerateConfig`]: storeforge_core::GenerateConfig

pub mod engine;
pub mod errors;
pub mod faker;
pub mod foreign;
pub mod model;
pub mod weights;

pub use engine::{GeneratedDataset, GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GenerationReport, TableReport};
