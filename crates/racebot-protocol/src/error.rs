//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding or encoding protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line is not a JSON object with a `msgType` field.
    #[error("Malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    /// The frame was well-formed but its payload does not match the message type.
    #[error("Invalid {msg_type} payload: {source}")]
    Payload {
        /// The `msgType` of the offending frame.
        msg_type: String,
        /// Underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Message type associated with this error, when the frame got that far.
    pub fn msg_type(&self) -> Option<&str> {
        match self {
            Self::Frame(_) => None,
            Self::Payload { msg_type, .. } => Some(msg_type),
        }
    }
}
