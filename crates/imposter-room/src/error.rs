//! Error types for the room layer.

use imposter_game::GameError;
use imposter_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room's actor has stopped or its channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    /// Every generated code collided with a live room.
    #[error("no free room code after {0} attempts")]
    CodesExhausted(usize),

    /// The game rejected the command.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// Stable machine-readable code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "room_not_found",
            Self::Unavailable(_) => "room_unavailable",
            Self::CodesExhausted(_) => "codes_exhausted",
            Self::Game(err) => err.reason(),
        }
    }

    /// HTTP-style status for the wire.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Unavailable(_) | Self::CodesExhausted(_) => 503,
            Self::Game(err) => err.status(),
        }
    }
}
