use std::time::Duration;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{operation} exceeded its {deadline:?} deadline")]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },

    #[error("store unreachable: {0}")]
    Connectivity(String),

    #[error("invalid request: {0}")]
    Validation(String),

    /// Produced by the migration auto-linker. Only ever logged and reported
    /// alongside a successful vmi upsert.
    #[error("migration {migration_uuid} sync failed: {source}")]
    SyncSwallowed {
        migration_uuid: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
