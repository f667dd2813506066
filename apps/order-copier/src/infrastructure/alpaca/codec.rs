//! Stream Codec Module
//!
//! JSON encoding and decoding for the trade updates stream.
//!
//! The trading stream delivers single JSON objects, sometimes in binary
//! frames; error frames may arrive wrapped in an array. Messages are
//! dispatched on the `T` field first, then on `stream`.

use crate::infrastructure::alpaca::messages::{
    AlpacaMessage, AuthorizationMessage, ErrorMessage, ListeningMessage, TradeUpdateMessage,
};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary frame was not UTF-8.
    #[error("binary frame is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Unknown message type.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// Invalid message format.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// JSON codec for the trade updates stream.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON parsing fails or a message has an unknown
    /// or missing type.
    pub fn decode(&self, text: &str) -> Result<Vec<AlpacaMessage>, CodecError> {
        let trimmed = text.trim();

        if trimmed.starts_with('[') {
            let raw: Vec<serde_json::Value> = serde_json::from_str(trimmed)?;
            raw.into_iter().map(decode_value).collect()
        } else if trimmed.starts_with('{') {
            let value: serde_json::Value = serde_json::from_str(trimmed)?;
            Ok(vec![decode_value(value)?])
        } else {
            let preview: String = trimmed.chars().take(50).collect();
            Err(CodecError::InvalidFormat(format!(
                "expected JSON array or object, got: {preview}..."
            )))
        }
    }

    /// Decode a binary frame holding UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not UTF-8 or fail to decode.
    pub fn decode_binary(&self, data: &[u8]) -> Result<Vec<AlpacaMessage>, CodecError> {
        self.decode(std::str::from_utf8(data)?)
    }

    /// Encode a value to JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

fn decode_value(value: serde_json::Value) -> Result<AlpacaMessage, CodecError> {
    let msg_type = value
        .get("T")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("stream").and_then(|v| v.as_str()))
        .map(str::to_owned);

    match msg_type.as_deref() {
        Some("error") => Ok(AlpacaMessage::Error(serde_json::from_value::<ErrorMessage>(
            value,
        )?)),
        Some("trade_updates") => Ok(AlpacaMessage::TradeUpdate(Box::new(
            serde_json::from_value::<TradeUpdateMessage>(value)?,
        ))),
        Some("authorization") => Ok(AlpacaMessage::Authorization(serde_json::from_value::<
            AuthorizationMessage,
        >(value)?)),
        Some("listening") => Ok(AlpacaMessage::Listening(
            serde_json::from_value::<ListeningMessage>(value)?,
        )),
        Some(other) => Err(CodecError::UnknownMessageType(other.to_string())),
        None => Err(CodecError::InvalidFormat(
            "message has neither T nor stream field".to_string(),
        )),
    }
}
