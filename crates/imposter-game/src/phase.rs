//! The phase state machine.

use serde::{Deserialize, Serialize};

/// Where a session is in the game.
///
/// Every forward move is an explicit moderator command:
///
/// ```text
/// Lobby → WordReveal → ClueCircle → Discussion → Voting → Results
///       → [TieBreak] → Elimination → WordReveal | GameOver
/// ```
///
/// - **Lobby**: accepting first-time joins. Nothing secret exists yet.
/// - **WordReveal**: roles and words are assigned; players read their word.
/// - **ClueCircle**: players give one-word clues in the shuffled turn order.
/// - **Discussion**: open talk.
/// - **Voting**: alive players each cast one final vote.
/// - **Results**: the tally is shown; a tie-break may be pending.
/// - **TieBreak**: the random pick among tied candidates has been made.
/// - **Elimination**: confirmed players are out. Next round or game over.
/// - **GameOver**: two or fewer players remain. Only `reset` moves on.
///
/// `reset` returns to `Lobby` from anywhere and is not modeled as a
/// transition here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Lobby,
    WordReveal,
    ClueCircle,
    Discussion,
    Voting,
    Results,
    TieBreak,
    Elimination,
    GameOver,
}

impl Phase {
    /// Returns `true` if a first-time player may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` between round start and the end of the game.
    pub fn is_in_round(self) -> bool {
        !matches!(self, Self::Lobby | Self::GameOver)
    }

    /// Returns `true` if `target` is a legal successor of `self`.
    ///
    /// `Results` has two successors; which one is allowed also depends on
    /// whether a tie-break is pending, which the session checks separately.
    pub fn can_transition_to(self, target: Self) -> bool {
        use Phase::*;
        matches!(
            (self, target),
            (Lobby, WordReveal)
                | (WordReveal, ClueCircle)
                | (ClueCircle, Discussion)
                | (Discussion, Voting)
                | (Voting, Results)
                | (Results, TieBreak)
                | (Results, Elimination)
                | (TieBreak, Elimination)
                | (Elimination, WordReveal)
                | (Elimination, GameOver)
        )
    }

    /// The wire name, e.g. `WORD_REVEAL`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "LOBBY",
            Self::WordReveal => "WORD_REVEAL",
            Self::ClueCircle => "CLUE_CIRCLE",
            Self::Discussion => "DISCUSSION",
            Self::Voting => "VOTING",
            Self::Results => "RESULTS",
            Self::TieBreak => "TIE_BREAK",
            Self::Elimination => "ELIMINATION",
            Self::GameOver => "GAME_OVER",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
