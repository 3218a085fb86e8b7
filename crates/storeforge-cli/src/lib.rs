//! Shared plumbing for the `storeforge-generate` and `storeforge-load`
//! binaries: run registry, logging and end-of-run summaries.

pub mod errors;
pub mod registry;
pub mod summary;

pub use errors::CliError;
