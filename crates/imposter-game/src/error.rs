//! Error types for the game core.
//!
//! Every rejection is recoverable: the session is left exactly as it was
//! and the caller relays the reason to whoever sent the command. Each
//! variant has a stable snake_case [`reason`](GameError::reason) for
//! clients to branch on and an HTTP-flavored [`status`](GameError::status).

use imposter_protocol::{ConnectionId, ParticipantId};
use serde::Serialize;

use crate::Phase;

/// Why a vote was refused. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum VoteRejection {
    /// Voter or target isn't in this room.
    #[error("voter or target is not in this room")]
    UnknownParticipant,

    #[error("eliminated players cannot vote")]
    VoterEliminated,

    #[error("that player is already eliminated")]
    TargetEliminated,

    #[error("you cannot vote for yourself")]
    SelfVote,

    /// Votes are final; there is no changing your mind.
    #[error("you already voted this round")]
    AlreadyVoted,
}

impl VoteRejection {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::UnknownParticipant => "unknown_participant",
            Self::VoterEliminated => "voter_eliminated",
            Self::TargetEliminated => "target_eliminated",
            Self::SelfVote => "self_vote",
            Self::AlreadyVoted => "already_voted",
        }
    }
}

/// Errors returned by [`Session`](crate::Session) commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("participant {0} not found")]
    ParticipantNotFound(ParticipantId),

    /// No participant is bound to this connection (already disconnected,
    /// or it never joined as a player).
    #[error("no participant on connection {0}")]
    ConnectionNotFound(ConnectionId),

    /// The command isn't legal in the current phase.
    #[error("cannot {command} during {phase}")]
    WrongPhase { command: &'static str, phase: Phase },

    /// Someone connected right now already uses this name.
    #[error("the name {0:?} is already taken")]
    NameTaken(String),

    /// The seat token belongs to a player who is still connected.
    #[error("the seat of {0:?} is in use")]
    SeatTaken(String),

    #[error("name must be between 1 and {max} characters")]
    InvalidName { max: usize },

    /// First-time joins are only accepted in the lobby.
    #[error("the game has already started; only returning players can join")]
    GameAlreadyStarted,

    #[error("need at least {required} alive players to start a round, have {alive}")]
    NotEnoughPlayers { alive: usize, required: usize },

    #[error("vote rejected: {0}")]
    Vote(#[from] VoteRejection),

    #[error("no tie-break is pending")]
    NoTieBreakPending,

    /// Eliminations can't run while the tally still has open slots.
    #[error("the tie-break must be resolved first")]
    TieBreakPending,

    #[error("participant {0} is already eliminated")]
    AlreadyEliminated(ParticipantId),

    #[error("setting {0} must be a positive number of seconds")]
    InvalidSetting(&'static str),
}

impl GameError {
    /// Stable machine-readable code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ParticipantNotFound(_) => "participant_not_found",
            Self::ConnectionNotFound(_) => "connection_not_found",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::NameTaken(_) => "name_taken",
            Self::SeatTaken(_) => "seat_taken",
            Self::InvalidName { .. } => "invalid_name",
            Self::GameAlreadyStarted => "game_already_started",
            Self::NotEnoughPlayers { .. } => "not_enough_players",
            Self::Vote(rejection) => rejection.code(),
            Self::NoTieBreakPending => "no_tie_break_pending",
            Self::TieBreakPending => "tie_break_pending",
            Self::AlreadyEliminated(_) => "already_eliminated",
            Self::InvalidSetting(_) => "invalid_setting",
        }
    }

    /// HTTP-style status for the wire.
    pub fn status(&self) -> u16 {
        match self {
            Self::ParticipantNotFound(_) | Self::ConnectionNotFound(_) => 404,
            Self::WrongPhase { .. }
            | Self::NameTaken(_)
            | Self::SeatTaken(_)
            | Self::GameAlreadyStarted
            | Self::NotEnoughPlayers { .. }
            | Self::NoTieBreakPending
            | Self::TieBreakPending
            | Self::AlreadyEliminated(_) => 409,
            Self::InvalidName { .. } | Self::Vote(_) | Self::InvalidSetting(_) => 422,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_rejection_codes_are_distinct() {
        let codes = [
            VoteRejection::UnknownParticipant.code(),
            VoteRejection::VoterEliminated.code(),
            VoteRejection::TargetEliminated.code(),
            VoteRejection::SelfVote.code(),
            VoteRejection::AlreadyVoted.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_vote_rejection_code_matches_serde() {
        let json = serde_json::to_string(&VoteRejection::SelfVote).unwrap();
        assert_eq!(json, format!("\"{}\"", VoteRejection::SelfVote.code()));
    }

    #[test]
    fn test_game_error_vote_uses_rejection_code() {
        let err: GameError = VoteRejection::AlreadyVoted.into();
        assert_eq!(err.reason(), "already_voted");
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn test_game_error_wrong_phase_message() {
        let err = GameError::WrongPhase {
            command: "close_voting",
            phase: Phase::Discussion,
        };
        assert_eq!(err.to_string(), "cannot close_voting during DISCUSSION");
        assert_eq!(err.status(), 409);
    }
}
