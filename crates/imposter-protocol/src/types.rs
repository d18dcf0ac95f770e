//! Core protocol types for the Find The Imposter wire format.
//!
//! Everything in this module either identifies something (a participant, a
//! room, a class of recipients) or travels on the wire between a client and
//! the server. Game-specific payloads (commands, events, state views) are
//! defined by the game crate and ride inside [`Payload::Game`] as opaque
//! bytes, so this crate never needs to know the rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Stable identifier of a participant within one room.
///
/// Allocated once when a player first joins and handed back to the client,
/// which presents it again to reconnect. It is a newtype over `u64` so it
/// can't be confused with any other number flowing through the server, and
/// `#[serde(transparent)]` keeps it a plain number in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The secret a player presents to take their seat back after a reload.
///
/// Participant ids are public (every view lists them), so they can't double
/// as a reconnection key. A token is handed only to the player it belongs
/// to, in their `Welcome`. On the wire it is a 16-digit hex string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatToken(String);

impl SeatToken {
    /// Renders 64 random bits as a token.
    pub fn from_bits(bits: u64) -> Self {
        Self(format!("{bits:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SeatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeatToken(..)")
    }
}

/// A short, human-speakable room identifier such as `QXKM`.
///
/// Codes are [`RoomCode::LEN`] characters drawn from [`RoomCode::ALPHABET`],
/// which leaves out `I` and `O` because they read like `1` and `0` on a
/// projector. The code is stored as ASCII bytes, which makes it `Copy` like
/// the other identity types.
///
/// On the wire it is a plain string. Deserialization goes through
/// [`RoomCode::parse`], so a malformed code is rejected at decode time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode([u8; RoomCode::LEN]);

impl RoomCode {
    /// Number of characters in a room code.
    pub const LEN: usize = 4;

    /// The 24 characters a room code may contain.
    pub const ALPHABET: &'static [u8; 24] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

    /// Builds a code from alphabet positions. Indices wrap around the
    /// alphabet, so every input produces a valid code.
    pub fn from_indices(indices: [usize; Self::LEN]) -> Self {
        let alphabet = Self::ALPHABET;
        Self(indices.map(|i| alphabet[i % alphabet.len()]))
    }

    /// Parses user input into a room code.
    ///
    /// Players type codes off a screen, so surrounding whitespace is trimmed
    /// and lowercase letters are accepted.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] if the input has the wrong
    /// length or contains a character outside the alphabet.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let trimmed = input.trim();
        let invalid = || ProtocolError::InvalidRoomCode(trimmed.to_string());

        if trimmed.len() != Self::LEN {
            return Err(invalid());
        }

        let mut bytes = [0u8; Self::LEN];
        for (slot, ch) in bytes.iter_mut().zip(trimmed.bytes()) {
            let upper = ch.to_ascii_uppercase();
            if !Self::ALPHABET.contains(&upper) {
                return Err(invalid());
            }
            *slot = upper;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomCode({self})")
    }
}

impl std::str::FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.to_string()
    }
}

// ---------------------------------------------------------------------------
// Audience: who should see an event?
// ---------------------------------------------------------------------------

/// The class of client an event is addressed to.
///
/// The game core never talks to sockets. Instead every command returns a
/// list of `(Audience, event)` pairs, and the room layer delivers each event
/// to the connections subscribed under that audience. Keeping secrets safe
/// is mostly a matter of picking the right variant here: a word assignment
/// goes to `Participant(id)`, never to `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Audience {
    /// The shared screen (projector/TV). Sees no secrets.
    Display,

    /// The moderator's control panel. Sees everything.
    Operator,

    /// One specific player.
    Participant(ParticipantId),

    /// Every connected player, but not the display or the moderator.
    Participants,

    /// Every connection in the room.
    Everyone,
}

// ---------------------------------------------------------------------------
// Hello: how a connection introduces itself
// ---------------------------------------------------------------------------

/// What a new connection wants to be.
///
/// `#[serde(tag = "role")]` produces `{ "role": "player", "room": "QXKM",
/// "name": "Ada" }` instead of an externally tagged object, which is easier
/// to build from a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ClientRole {
    /// Runs the game. Without a room code a fresh room is created; with one,
    /// the connection takes over the controls of an existing room.
    Moderator {
        #[serde(default)]
        room: Option<RoomCode>,
    },

    /// A shared screen showing the public state of a room.
    Display { room: RoomCode },

    /// A player's phone. `token` is the [`SeatToken`] handed out on a
    /// previous join and is how a refreshed page gets its seat back.
    Player {
        room: RoomCode,
        name: String,
        #[serde(default)]
        token: Option<SeatToken>,
    },
}

// ---------------------------------------------------------------------------
// SystemMessage: connection-level messages
// ---------------------------------------------------------------------------

/// Messages handled by the server itself rather than by a room.
///
/// `#[serde(tag = "type")]` makes this "internally tagged":
/// `{ "type": "Heartbeat", "client_time": 5000 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: the first message on every connection.
    Hello { version: u32, client: ClientRole },

    /// Server → Client: the connection is attached to `room`.
    ///
    /// Players get their `participant_id` and their `token` (store it, it
    /// is the reconnection key) and learn whether they took back an
    /// existing seat.
    Welcome {
        room: RoomCode,
        participant_id: Option<ParticipantId>,
        #[serde(default)]
        token: Option<SeatToken>,
        reconnected: bool,
        server_time: u64,
    },

    /// Either direction: "I'm going away."
    Goodbye { reason: String },

    /// Client → Server: keep-alive.
    Heartbeat { client_time: u64 },

    /// Server → Client: keep-alive reply, echoing the client's timestamp.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Server → Client: a request was rejected.
    ///
    /// `code` is HTTP-flavored (400 malformed, 403 forbidden, 404 not
    /// found, 409 conflict, 422 validation). `reason` is a stable
    /// snake_case code a client can branch on; `message` is for humans.
    Error {
        code: u16,
        reason: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Payload and Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope: a system message or opaque game bytes.
///
/// Adjacently tagged, so a game payload looks like
/// `{ "type": "Game", "data": [123, 34, ...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A connection-level message.
    System(SystemMessage),

    /// A game command (client → server) or a game reply, event, or view
    /// (server → client), encoded by the server's codec.
    Game(Vec<u8>),
}

/// The top-level message wrapper. Every frame on the wire is an Envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,

    pub payload: Payload,
}

impl Envelope {
    /// Wraps a system message.
    pub fn system(seq: u64, timestamp: u64, msg: SystemMessage) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::System(msg),
        }
    }

    /// Wraps already-encoded game bytes.
    pub fn game(seq: u64, timestamp: u64, data: Vec<u8>) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::Game(data),
        }
    }
}
