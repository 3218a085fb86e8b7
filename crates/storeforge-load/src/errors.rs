use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("unsupported database url scheme: {0}")]
    UnsupportedEngine(String),
    #[error("schema mismatch for {entity}: {message}")]
    SchemaMismatch { entity: String, message: String },
    #[error("{entity} line {line} ({key}): {message}")]
    ConstraintViolation {
        entity: String,
        line: u64,
        key: String,
        message: String,
    },
    #[error("invalid schema: {0}")]
    Schema(#[from] storeforge_core::Error),
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    pub fn mismatch(entity: &str, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    /// Errors that end the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LoadError::Connection(_) | LoadError::UnsupportedEngine(_) | LoadError::Schema(_)
        )
    }
}

impl From<sqlx::Error> for LoadError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => LoadError::Connection(err.to_string()),
            other => LoadError::Database(other),
        }
    }
}
