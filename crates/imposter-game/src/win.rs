//! Deciding the winner.
//!
//! Only consulted once eliminations leave two or fewer alive. The last
//! player confirmed out decides it: if that was an imposter, the majority
//! caught them in time.

use imposter_protocol::ParticipantId;
use serde::{Deserialize, Serialize};

use crate::roster::{ParticipantRef, Roster, Side};

/// How the game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Side,
    pub message: String,
    pub survivors: Vec<ParticipantRef>,
    /// The imposter that decided it: the one just eliminated, or a
    /// surviving one.
    pub imposter: Option<ParticipantRef>,
}

/// Evaluates the end of the game from the ordered confirmed list.
pub fn evaluate(roster: &Roster, confirmed: &[ParticipantId]) -> GameOutcome {
    let survivors = roster.alive().map(|p| p.to_ref()).collect();
    let last = confirmed.last().and_then(|id| roster.get(*id));

    match last {
        Some(caught) if caught.is_imposter() => GameOutcome {
            winner: Side::Majority,
            message: "The imposter has been caught! Majority wins!".to_string(),
            survivors,
            imposter: Some(caught.to_ref()),
        },
        _ => GameOutcome {
            winner: Side::Imposter,
            message: "The imposter survived! Imposter wins!".to_string(),
            survivors,
            imposter: roster.alive().find(|p| p.is_imposter()).map(|p| p.to_ref()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Assignment;
    use imposter_protocol::ConnectionId;

    /// Three players; `imposter` gets the imposter word.
    fn final_three(imposter: u64) -> Roster {
        let mut roster = Roster::new();
        for i in 1..=3 {
            roster
                .join(&format!("P{i}"), None, ConnectionId::new(i), true)
                .unwrap();
            let side = if i == imposter {
                Side::Imposter
            } else {
                Side::Majority
            };
            roster.assign(
                ParticipantId(i),
                Assignment {
                    side,
                    word: "w".into(),
                },
            );
        }
        roster
    }

    #[test]
    fn test_evaluate_imposter_eliminated_majority_wins() {
        let mut roster = final_three(2);
        roster.eliminate(ParticipantId(2)).unwrap();

        let outcome = evaluate(&roster, &[ParticipantId(2)]);
        assert_eq!(outcome.winner, Side::Majority);
        assert_eq!(outcome.imposter.unwrap().id, ParticipantId(2));
        assert_eq!(outcome.survivors.len(), 2);
    }

    #[test]
    fn test_evaluate_majority_eliminated_imposter_wins() {
        let mut roster = final_three(2);
        roster.eliminate(ParticipantId(1)).unwrap();

        let outcome = evaluate(&roster, &[ParticipantId(1)]);
        assert_eq!(outcome.winner, Side::Imposter);
        assert_eq!(outcome.message, "The imposter survived! Imposter wins!");
        assert_eq!(outcome.imposter.unwrap().id, ParticipantId(2));
    }

    #[test]
    fn test_evaluate_uses_last_confirmed() {
        let mut roster = final_three(3);
        roster.eliminate(ParticipantId(3)).unwrap();
        roster.eliminate(ParticipantId(1)).unwrap();

        let outcome = evaluate(&roster, &[ParticipantId(3), ParticipantId(1)]);
        assert_eq!(outcome.winner, Side::Imposter);
    }

    #[test]
    fn test_evaluate_empty_confirmed_imposter_wins() {
        let roster = final_three(1);
        let outcome = evaluate(&roster, &[]);
        assert_eq!(outcome.winner, Side::Imposter);
    }
}
