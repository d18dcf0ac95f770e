//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value). Malformed JSON, a
    /// missing field, or an unknown `type` tag all end up here.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A string that should have been a room code wasn't one.
    #[error("invalid room code {0:?}")]
    InvalidRoomCode(String),

    /// The message decoded fine but breaks a protocol rule, e.g. a
    /// connection whose first message isn't `Hello`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
