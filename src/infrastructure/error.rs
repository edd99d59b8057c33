use std::time::Duration;
use thiserror::Error;

// Failures of remote reads and writes. `Clone` so one in-flight result can be
// handed to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
    #[error("Record store rejected request: {0}")]
    RemoteRejected(String),
    #[error("Validation failed: {0}")]
    LocalValidation(String),
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Sync(#[from] SyncError),
}
