//! Game payloads carried inside [`Payload::Game`](imposter_protocol::Payload::Game).
//!
//! Clients send a [`ClientCommand`]; the server answers with
//! [`ServerMessage`]s. What a connection may send depends on its [`Seat`],
//! fixed by the role it announced in `Hello`.

use imposter_game::{Command, GameEvent, Reply, SettingsUpdate, View, Viewer};
use imposter_protocol::ParticipantId;
use serde::{Deserialize, Serialize};

use crate::ImposterError;

/// What a connection is, once its `Hello` has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Moderator,
    Display,
    Player(ParticipantId),
}

impl Seat {
    /// The projection this seat is allowed to see.
    pub fn viewer(self) -> Viewer {
        match self {
            Self::Moderator => Viewer::Operator,
            Self::Display => Viewer::Display,
            Self::Player(id) => Viewer::Participant(id),
        }
    }
}

/// A command from a client.
///
/// `{ "command": "cast_vote", "target": 3 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    Kick {
        participant_id: ParticipantId,
    },
    StartRound,
    StartClueCircle,
    AdvanceClue,
    StartDiscussion,
    StartVoting,
    /// Players vote as themselves and leave `voter` out. The moderator
    /// can record a vote on someone's behalf by naming the voter.
    CastVote {
        target: ParticipantId,
        #[serde(default)]
        voter: Option<ParticipantId>,
    },
    CloseVoting,
    ResolveTieBreak,
    ExecuteEliminations,
    Reset,
    UpdateSettings {
        settings: SettingsUpdate,
    },
    /// Asks for a fresh copy of this connection's view.
    RequestView,
    /// Moderator only: shuts the room down and disconnects everyone.
    CloseRoom,
}

impl ClientCommand {
    /// Turns a client command into a game command, enforcing what `seat`
    /// may do.
    ///
    /// [`ClientCommand::RequestView`] and [`ClientCommand::CloseRoom`]
    /// don't map to game commands; the connection handler deals with them
    /// itself.
    ///
    /// # Errors
    /// [`ImposterError::Forbidden`] if the seat may not send this command,
    /// [`ImposterError::InvalidCommand`] if it can't become a game command.
    pub fn into_command(self, seat: Seat) -> Result<Command, ImposterError> {
        match (seat, self) {
            (Seat::Display, _) => Err(ImposterError::Forbidden(
                "displays cannot send commands".into(),
            )),
            (Seat::Player(me), Self::CastVote { target, voter }) => match voter {
                Some(other) if other != me => Err(ImposterError::Forbidden(
                    "players can only vote as themselves".into(),
                )),
                _ => Ok(Command::CastVote { voter: me, target }),
            },
            (Seat::Player(_), _) => Err(ImposterError::Forbidden(
                "players may only cast votes".into(),
            )),
            (Seat::Moderator, command) => command.into_moderator_command(),
        }
    }

    fn into_moderator_command(self) -> Result<Command, ImposterError> {
        Ok(match self {
            Self::Kick { participant_id } => Command::Kick { participant_id },
            Self::StartRound => Command::StartRound,
            Self::StartClueCircle => Command::StartClueCircle,
            Self::AdvanceClue => Command::AdvanceClue,
            Self::StartDiscussion => Command::StartDiscussion,
            Self::StartVoting => Command::StartVoting,
            Self::CastVote { target, voter } => Command::CastVote {
                voter: voter.ok_or_else(|| {
                    ImposterError::InvalidCommand("cast_vote from the moderator needs a voter".into())
                })?,
                target,
            },
            Self::CloseVoting => Command::CloseVoting,
            Self::ResolveTieBreak => Command::ResolveTieBreak,
            Self::ExecuteEliminations => Command::ExecuteEliminations,
            Self::Reset => Command::Reset,
            Self::UpdateSettings { settings } => Command::UpdateSettings(settings),
            Self::RequestView | Self::CloseRoom => {
                return Err(ImposterError::InvalidCommand(
                    "not a game command".into(),
                ));
            }
        })
    }
}

/// A game message from the server.
///
/// `{ "kind": "event", "body": { "event": "player_joined", ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The answer to this connection's own command.
    Reply(Reply),
    Event(GameEvent),
    View(View),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u64) -> ParticipantId {
        ParticipantId(n)
    }

    #[test]
    fn test_client_command_parses_browser_json() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{ "command": "cast_vote", "target": 3 }"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::CastVote {
                target: pid(3),
                voter: None
            }
        );

        let cmd: ClientCommand = serde_json::from_str(
            r#"{ "command": "update_settings", "settings": { "voting_secs": 60 } }"#,
        )
        .unwrap();
        assert!(matches!(cmd, ClientCommand::UpdateSettings { .. }));
    }

    #[test]
    fn test_into_command_player_votes_as_self() {
        let cmd = ClientCommand::CastVote {
            target: pid(2),
            voter: None,
        };
        assert_eq!(
            cmd.into_command(Seat::Player(pid(1))).unwrap(),
            Command::CastVote {
                voter: pid(1),
                target: pid(2)
            }
        );
    }

    #[test]
    fn test_into_command_player_cannot_impersonate() {
        let cmd = ClientCommand::CastVote {
            target: pid(2),
            voter: Some(pid(3)),
        };
        let err = cmd.into_command(Seat::Player(pid(1))).unwrap_err();
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn test_into_command_player_cannot_moderate() {
        let err = ClientCommand::StartRound
            .into_command(Seat::Player(pid(1)))
            .unwrap_err();
        assert!(matches!(err, ImposterError::Forbidden(_)));
    }

    #[test]
    fn test_into_command_display_cannot_send() {
        let err = ClientCommand::CastVote {
            target: pid(1),
            voter: None,
        }
        .into_command(Seat::Display)
        .unwrap_err();
        assert!(matches!(err, ImposterError::Forbidden(_)));
    }

    #[test]
    fn test_into_command_moderator_vote_needs_voter() {
        let err = ClientCommand::CastVote {
            target: pid(1),
            voter: None,
        }
        .into_command(Seat::Moderator)
        .unwrap_err();
        assert_eq!(err.reason(), "invalid_command");

        let cmd = ClientCommand::Kick {
            participant_id: pid(4),
        }
        .into_command(Seat::Moderator)
        .unwrap();
        assert_eq!(
            cmd,
            Command::Kick {
                participant_id: pid(4)
            }
        );
    }

    #[test]
    fn test_seat_viewer() {
        assert_eq!(Seat::Moderator.viewer(), Viewer::Operator);
        assert_eq!(Seat::Display.viewer(), Viewer::Display);
        assert_eq!(Seat::Player(pid(2)).viewer(), Viewer::Participant(pid(2)));
    }

    #[test]
    fn test_server_message_reply_shape() {
        let msg = ServerMessage::Reply(Reply::Reset { applied: true });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "reply");
        assert_eq!(json["body"]["reply"], "reset");
    }
}
