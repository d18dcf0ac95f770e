//! Unified error type for the server.

use imposter_protocol::ProtocolError;
use imposter_room::RoomError;
use imposter_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapped variant generates a `From`
/// impl, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ImposterError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad room code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error, including game rejections.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The first message wasn't an acceptable `Hello`.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The connection's seat doesn't allow this command.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The command was well-formed JSON but not usable as sent.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

impl ImposterError {
    /// Stable machine-readable code for `SystemMessage::Error`.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Protocol(_) => "malformed",
            Self::Room(err) => err.reason(),
            Self::Handshake(_) => "bad_handshake",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidCommand(_) => "invalid_command",
        }
    }

    /// HTTP-style status for `SystemMessage::Error`.
    pub fn status(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::Protocol(_) | Self::Handshake(_) | Self::InvalidCommand(_) => 400,
            Self::Room(err) => err.status(),
            Self::Forbidden(_) => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imposter_game::{GameError, Phase};
    use imposter_protocol::RoomCode;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let imposter_err: ImposterError = err.into();
        assert!(matches!(imposter_err, ImposterError::Transport(_)));
        assert!(imposter_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRoomCode("IO".into());
        let imposter_err: ImposterError = err.into();
        assert!(matches!(imposter_err, ImposterError::Protocol(_)));
        assert_eq!(imposter_err.status(), 400);
    }

    #[test]
    fn test_from_room_error_keeps_game_reason() {
        let err = RoomError::Game(GameError::WrongPhase {
            command: "start_voting",
            phase: Phase::Lobby,
        });
        let imposter_err: ImposterError = err.into();
        assert_eq!(imposter_err.reason(), "wrong_phase");
        assert_eq!(imposter_err.status(), 409);
    }

    #[test]
    fn test_room_not_found_is_404() {
        let code = RoomCode::parse("ABCD").unwrap();
        let imposter_err: ImposterError = RoomError::NotFound(code).into();
        assert_eq!(imposter_err.status(), 404);
        assert_eq!(imposter_err.reason(), "room_not_found");
    }

    #[test]
    fn test_forbidden_is_403() {
        let err = ImposterError::Forbidden("players may only vote".into());
        assert_eq!(err.status(), 403);
        assert_eq!(err.reason(), "forbidden");
    }
}
