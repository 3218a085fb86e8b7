use thiserror::Error;

/// Core error type shared across storeforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// An entity declaration violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Foreign keys between entities form a cycle.
    #[error("foreign key cycle between: {}", .0.join(", "))]
    Cycle(Vec<String>),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by storeforge crates.
pub type Result<T> = std::result::Result<T, Error>;
