//! Notifications produced by session commands.

use serde::{Deserialize, Serialize};

use crate::ballot::{PublicTally, TallyResult, TieBreakResult, VoteReceipt};
use crate::roster::{ParticipantRef, Side};
use crate::round::{ClueOrder, ClueStep, RoundSetup};
use crate::win::GameOutcome;
use crate::words::WordPair;
use crate::Settings;
use imposter_protocol::ParticipantId;

/// Why a participant left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    Vote,
    TieBreak,
    Kick,
}

/// One line of the elimination history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationRecord {
    pub round: u32,
    pub id: ParticipantId,
    pub name: String,
    pub was_imposter: bool,
    pub word: Option<String>,
    pub cause: EliminationCause,
}

/// What `execute_eliminations` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationResult {
    pub eliminated: Vec<EliminationRecord>,
    pub alive_count: usize,
    /// Set when this elimination ended the game.
    pub outcome: Option<GameOutcome>,
}

/// Something clients should hear about. Each event is queued together with
/// the [`Audience`](imposter_protocol::Audience) allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        participant: ParticipantRef,
        total: usize,
    },
    PlayerReconnected {
        participant: ParticipantRef,
    },
    PlayerDisconnected {
        participant: ParticipantRef,
    },
    PlayerKicked {
        participant: ParticipantRef,
    },
    RoundStarted {
        setup: RoundSetup,
        reveal_secs: u32,
    },
    /// Private: the recipient's word. Never their side.
    WordAssigned {
        round: u32,
        word: String,
        reveal_secs: u32,
    },
    ClueCircleStarted {
        order: ClueOrder,
        clue_secs: u32,
    },
    ClueAdvanced {
        step: ClueStep,
        clue_secs: u32,
    },
    DiscussionStarted {
        duration_secs: u32,
    },
    VotingStarted {
        duration_secs: u32,
    },
    /// Private: who the recipient may vote for.
    VotingOpened {
        candidates: Vec<ParticipantRef>,
        duration_secs: u32,
    },
    VoteProgress {
        receipt: VoteReceipt,
    },
    /// Operator only: includes roles.
    VotesTallied {
        result: TallyResult,
    },
    /// The display's version of [`GameEvent::VotesTallied`].
    VoteResults {
        result: PublicTally,
    },
    TieBreakResolved {
        result: TieBreakResult,
    },
    EliminationsExecuted {
        result: EliminationResult,
        word_pair: Option<WordPair>,
    },
    /// Private: sent to each player as they go out.
    YouWereEliminated {
        kicked: bool,
        side: Option<Side>,
        word: Option<String>,
    },
    GameOver {
        outcome: GameOutcome,
    },
    GameReset,
    SettingsChanged {
        settings: Settings,
    },
}
