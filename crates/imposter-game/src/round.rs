//! Round setup: how many imposters, who gets which word, who speaks when.

use imposter_protocol::ParticipantId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::roster::{Assignment, ParticipantRef, Roster, Side};
use crate::words::{Difficulty, WordPair};

/// Fewest alive players a round can start with.
pub const MIN_PLAYERS: usize = 3;

/// A round starting at or below this many alive players is decisive:
/// one imposter, and its elimination ends the game.
pub const FINAL_ROUND_ALIVE: usize = 3;

/// The game ends once eliminations leave this many or fewer alive.
pub const GAME_OVER_ALIVE: usize = 2;

/// Imposters for a round, which is also how many players the vote removes.
///
/// | alive  | imposters |
/// |--------|-----------|
/// | 1–6    | 1         |
/// | 7–15   | 2         |
/// | 16–25  | 3         |
/// | 26+    | 4         |
pub fn imposter_count(alive: usize) -> usize {
    if alive <= FINAL_ROUND_ALIVE {
        return 1;
    }
    match alive {
        0..=6 => 1,
        7..=15 => 2,
        16..=25 => 3,
        _ => 4,
    }
}

/// What the moderator learns when a round starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSetup {
    pub round: u32,
    pub alive_count: usize,
    pub imposter_count: usize,
    pub difficulty: Difficulty,
    pub is_final_round: bool,
}

/// Deals the pair to the living: the first `imposters` of a shuffle get the
/// imposter word and everyone else the main word.
pub(crate) fn assign_roles<R: Rng + ?Sized>(
    roster: &mut Roster,
    pair: &WordPair,
    imposters: usize,
    rng: &mut R,
) {
    let mut ids: Vec<ParticipantId> = roster.alive().map(|p| p.id()).collect();
    ids.shuffle(rng);

    for (i, id) in ids.into_iter().enumerate() {
        let assignment = if i < imposters {
            Assignment {
                side: Side::Imposter,
                word: pair.imposter_word.clone(),
            }
        } else {
            Assignment {
                side: Side::Majority,
                word: pair.main_word.clone(),
            }
        };
        roster.assign(id, assignment);
    }
}

/// A fresh shuffle of the living, independent of role assignment.
pub(crate) fn turn_order<R: Rng + ?Sized>(roster: &Roster, rng: &mut R) -> Vec<ParticipantId> {
    let mut ids: Vec<ParticipantId> = roster.alive().map(|p| p.id()).collect();
    ids.shuffle(rng);
    ids
}

/// The clue circle's speaking order and whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueOrder {
    pub order: Vec<ParticipantRef>,
    pub current_index: usize,
}

/// Outcome of advancing the clue cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClueStep {
    /// Everyone has spoken.
    Done,
    Speaker {
        index: usize,
        participant: ParticipantRef,
    },
}
