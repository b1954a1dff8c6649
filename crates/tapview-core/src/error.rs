//! Decode error types

use thiserror::Error;

/// Errors raised while turning an input line into events.
///
/// Missing optional fields are never errors; only the pieces every packet
/// record must carry are reported here.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Packet has no '{0}' layer")]
    MissingLayer(String),

    #[error("Layer '{layer}' has no '{field}' field")]
    MissingField { layer: String, field: String },

    #[error("Invalid packet JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
