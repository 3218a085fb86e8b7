use thiserror::Error;

use storeforge_core::ConfigError;
use storeforge_enrich::EnrichError;
use storeforge_generate::GenerationError;
use storeforge_load::LoadError;

use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("enrichment error: {0}")]
    Enrich(#[from] EnrichError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    /// The run completed but `--strict` turns its findings into a failure.
    #[error("strict mode: {0}")]
    Strict(String),
}
