//! Error types for feedsync data types.

use thiserror::Error;

/// Errors that can occur while interpreting feedsync data.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Collection name is not one of the synced collections
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// JSON decoding failed
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Invalid data format
    #[error("invalid data: {0}")]
    InvalidData(String),
}
