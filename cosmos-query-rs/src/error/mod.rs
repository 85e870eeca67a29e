//! Error handling for the Cosmos DB query client
//!
//! Every failure surfaces as one of five kinds, each carrying a
//! human-readable message built from the original cause. Nothing in this
//! crate retries; every operation is attempt-once.

use thiserror::Error;

pub mod mapping;

/// Result type for query client operations
pub type Result<T> = std::result::Result<T, CosmosError>;

/// Main error type for the query client
#[derive(Error, Debug)]
pub enum CosmosError {
    /// Connection, credential, or key-retrieval failures
    #[error("{0}")]
    Connection(String),

    /// An operation was attempted before `connect`
    #[error("Not connected to Cosmos DB. Call `connect` first.")]
    NotConnected,

    /// The database or container does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The server rejected the query
    #[error("Cosmos DB query error: {0}")]
    Query(String),

    /// Anything else, including transport errors
    #[error("{0}")]
    Other(String),
}

impl CosmosError {
    /// Create a connection error
    pub fn connection(cause: impl Into<String>) -> Self {
        CosmosError::Connection(format!("Failed to connect to Cosmos DB: {}", cause.into()))
    }

    /// Create a connection error for the control-plane key retrieval path
    pub fn key_retrieval(cause: impl Into<String>) -> Self {
        CosmosError::Connection(format!(
            "Failed to retrieve Cosmos DB key using Azure credentials: {}",
            cause.into()
        ))
    }

    /// Create a resource-not-found error
    pub fn not_found(cause: impl Into<String>) -> Self {
        CosmosError::NotFound(cause.into())
    }

    /// Create a query rejection error
    pub fn query(cause: impl Into<String>) -> Self {
        CosmosError::Query(cause.into())
    }

    /// Create a generic failure
    pub fn other(message: impl Into<String>) -> Self {
        CosmosError::Other(message.into())
    }
}

/// Convert reqwest errors to CosmosError
impl From<reqwest::Error> for CosmosError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CosmosError::other(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            CosmosError::other(format!("Connection error: {}", err))
        } else if err.is_decode() {
            CosmosError::other(format!("Response decode error: {}", err))
        } else {
            CosmosError::other(format!("HTTP client error: {}", err))
        }
    }
}

/// Convert serde_json errors to CosmosError
impl From<serde_json::Error> for CosmosError {
    fn from(err: serde_json::Error) -> Self {
        CosmosError::other(format!("JSON error: {}", err))
    }
}
