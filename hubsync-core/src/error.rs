use thiserror::Error;

pub type Result<T> = std::result::Result<T, HubSyncError>;

#[derive(Error, Debug)]
pub enum HubSyncError {
    /// Transient transport failure. Retried at the engine boundary and never
    /// surfaced past it.
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or failed catalog/tag-listing response.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Container engine command failure.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Corrupted or inconsistent progress ledger. Fatal: the ledger is never
    /// silently repaired.
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
