//! Error types for postcode lookups and storage.

use thiserror::Error;

/// Errors talking to the postcode lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected lookup response: {0}")]
    Parse(String),
}

/// Errors from the saved-postcode store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The lookup service did not recognise the postcode; nothing was stored.
    #[error("Postcode not recognised: {0}")]
    ValidationFailure(String),

    #[error("Postcode lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Stored postcodes for {email} are unreadable: {source}")]
    Corrupt {
        email: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::ValidationFailure(_))
    }
}
