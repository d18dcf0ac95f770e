//! Read-only projections of a session.
//!
//! Three audiences, three views. The display never sees a role or a word,
//! a player only ever sees their own word, and the moderator sees
//! everything.

use imposter_protocol::{Audience, ParticipantId, RoomCode};
use serde::{Deserialize, Serialize};

use crate::event::EliminationRecord;
use crate::roster::{ParticipantRef, Side};
use crate::words::{Difficulty, WordPair};
use crate::{Phase, Settings};

/// Who is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viewer {
    Display,
    Operator,
    Participant(ParticipantId),
}

impl Viewer {
    /// Returns `true` if an event addressed to `audience` reaches this viewer.
    pub fn receives(self, audience: Audience) -> bool {
        match (self, audience) {
            (_, Audience::Everyone) => true,
            (Self::Display, Audience::Display) => true,
            (Self::Operator, Audience::Operator) => true,
            (Self::Participant(_), Audience::Participants) => true,
            (Self::Participant(me), Audience::Participant(id)) => me == id,
            _ => false,
        }
    }
}

/// A roster row without secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParticipant {
    pub id: ParticipantId,
    pub name: String,
    pub alive: bool,
    pub connected: bool,
    pub has_voted: bool,
}

/// What the shared screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectatorView {
    pub room: RoomCode,
    pub phase: Phase,
    pub round: u32,
    pub settings: Settings,
    pub alive_count: usize,
    pub total_count: usize,
    /// Imposters this round, which is also the number of elimination
    /// slots. Zero in the lobby.
    pub imposters_this_round: usize,
    pub elimination_slots: usize,
    pub participants: Vec<PublicParticipant>,
    pub turn_order: Vec<ParticipantRef>,
    pub current_speaker_index: usize,
    pub difficulty: Option<Difficulty>,
    pub history: Vec<EliminationRecord>,
}

/// A roster row with the secret attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorParticipant {
    #[serde(flatten)]
    pub public: PublicParticipant,
    pub side: Option<Side>,
    pub word: Option<String>,
}

/// What the moderator sees: everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorView {
    #[serde(flatten)]
    pub spectator: SpectatorView,
    pub secrets: Vec<OperatorParticipant>,
    pub word_pair: Option<WordPair>,
}

/// What one player's phone shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub room: RoomCode,
    pub phase: Phase,
    pub round: u32,
    pub settings: Settings,
    pub me: ParticipantRef,
    pub alive: bool,
    pub has_voted: bool,
    pub alive_participants: Vec<ParticipantRef>,
    pub alive_count: usize,
    pub total_count: usize,
}

/// Any of the three views, tagged for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Spectator(SpectatorView),
    Operator(OperatorView),
    Participant(ParticipantView),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_receives_everyone() {
        for viewer in [
            Viewer::Display,
            Viewer::Operator,
            Viewer::Participant(ParticipantId(1)),
        ] {
            assert!(viewer.receives(Audience::Everyone));
        }
    }

    #[test]
    fn test_viewer_private_event_only_reaches_addressee() {
        let event = Audience::Participant(ParticipantId(2));
        assert!(Viewer::Participant(ParticipantId(2)).receives(event));
        assert!(!Viewer::Participant(ParticipantId(3)).receives(event));
        assert!(!Viewer::Display.receives(event));
        assert!(!Viewer::Operator.receives(event));
    }

    #[test]
    fn test_viewer_display_excluded_from_operator_events() {
        assert!(!Viewer::Display.receives(Audience::Operator));
        assert!(!Viewer::Display.receives(Audience::Participants));
        assert!(Viewer::Participant(ParticipantId(1)).receives(Audience::Participants));
    }
}
