//! Codec trait and the JSON implementation.
//!
//! The server encodes twice per outbound game message: the game crate's
//! value (reply, event, or view) becomes the bytes of a [`Payload::Game`],
//! and the [`Envelope`] around it becomes the frame. Both steps go through
//! the same [`Codec`] so a binary format could be swapped in later without
//! touching the connection handler.
//!
//! [`Payload::Game`]: crate::Payload::Game
//! [`Envelope`]: crate::Envelope

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts values to bytes and back.
///
/// `Send + Sync + 'static` because the codec lives in the server state that
/// every connection task shares.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Browsers are the only clients of this game, so JSON is the natural
/// default. Behind the `json` feature (on by default).
///
/// ```rust
/// use imposter_protocol::{Codec, Envelope, JsonCodec, SystemMessage};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::system(1, 5000, SystemMessage::Heartbeat { client_time: 5000 });
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
