//! Wire protocol for Find The Imposter.
//!
//! - **Types**: identities ([`ParticipantId`], [`SeatToken`], [`RoomCode`]), addressing
//!   ([`Audience`]) and the framing ([`Envelope`], [`Payload`],
//!   [`SystemMessage`]).
//! - **Codec**: [`Codec`] trait with the default [`JsonCodec`].
//! - **Errors**: [`ProtocolError`].
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (game commands)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use imposter_transport::ConnectionId;
pub use types::{
    Audience, ClientRole, Envelope, ParticipantId, Payload, RoomCode, SeatToken, SystemMessage,
};

/// The protocol version clients must announce in `Hello`.
pub const PROTOCOL_VERSION: u32 = 1;
