//! Envelope decoding errors.

use thiserror::Error;

/// Errors raised while packing or unpacking envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Unknown or malformed {kind} payload: {message}")]
    Payload { kind: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
