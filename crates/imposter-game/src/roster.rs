//! Who is in the room.
//!
//! Participants are never removed. Disconnecting only drops the connection
//! binding, and elimination only flips `alive`, so identifiers handed to
//! clients stay valid for the life of the session.
//!
//! Ids are public and sequential. Taking a seat back goes through the
//! participant's [`SeatToken`], which only that player ever sees.

use imposter_protocol::{ConnectionId, ParticipantId, SeatToken};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::GameError;

/// Longest display name accepted, in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 32;

/// Which word a participant was dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Majority,
    Imposter,
}

/// A participant's secret for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub side: Side,
    pub word: String,
}

/// Public identity of a participant: safe to show anyone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub id: ParticipantId,
    pub name: String,
}

/// One person in the room.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    alive: bool,
    assignment: Option<Assignment>,
    has_voted: bool,
    connection: Option<ConnectionId>,
    token: SeatToken,
}

impl Participant {
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn side(&self) -> Option<Side> {
        self.assignment.as_ref().map(|a| a.side)
    }

    pub fn is_imposter(&self) -> bool {
        self.side() == Some(Side::Imposter)
    }

    pub fn word(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.word.as_str())
    }

    pub fn has_voted(&self) -> bool {
        self.has_voted
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn token(&self) -> &SeatToken {
        &self.token
    }

    pub fn to_ref(&self) -> ParticipantRef {
        ParticipantRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Result of a successful [`Roster::join`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub participant: ParticipantRef,
    /// Private to the joining player: the key for taking the seat back.
    pub token: SeatToken,
    /// `true` if an existing participant was rebound rather than created.
    pub reconnected: bool,
}

/// The participants of one session, in join order.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
    next_id: u64,
    tokens: StdRng,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            participants: Vec::new(),
            next_id: 0,
            tokens: StdRng::from_rng(&mut rand::rng()),
        }
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player, or rebinds a returning one.
    ///
    /// Resolution order:
    /// 1. `claimed` is the token of an existing participant: rejected if
    ///    they are connected, otherwise rebound, in any phase.
    /// 2. The trimmed name matches someone case-insensitively: rejected if
    ///    they are connected, otherwise rebound.
    /// 3. A first-time join, only when `accepting_new` is set.
    ///
    /// # Errors
    /// [`GameError::SeatTaken`], [`GameError::NameTaken`],
    /// [`GameError::GameAlreadyStarted`], or [`GameError::InvalidName`].
    pub fn join(
        &mut self,
        name: &str,
        claimed: Option<&SeatToken>,
        connection: ConnectionId,
        accepting_new: bool,
    ) -> Result<JoinReceipt, GameError> {
        if let Some(index) = claimed.and_then(|token| self.position_by_token(token)) {
            return Self::rebind(&mut self.participants[index], connection, GameError::SeatTaken);
        }

        let name = name.trim();
        if let Some(index) = self.position_by_name(name) {
            return Self::rebind(&mut self.participants[index], connection, GameError::NameTaken);
        }

        if !accepting_new {
            return Err(GameError::GameAlreadyStarted);
        }
        let chars = name.chars().count();
        if chars == 0 || chars > MAX_NAME_CHARS {
            return Err(GameError::InvalidName {
                max: MAX_NAME_CHARS,
            });
        }

        self.next_id += 1;
        let participant = Participant {
            id: ParticipantId(self.next_id),
            name: name.to_string(),
            alive: true,
            assignment: None,
            has_voted: false,
            connection: Some(connection),
            token: SeatToken::from_bits(self.tokens.random()),
        };
        let receipt = JoinReceipt {
            participant: participant.to_ref(),
            token: participant.token.clone(),
            reconnected: false,
        };
        self.participants.push(participant);
        Ok(receipt)
    }

    /// Hands a disconnected seat to `connection`. A seat that is still
    /// connected stays with its current holder.
    fn rebind(
        participant: &mut Participant,
        connection: ConnectionId,
        taken: fn(String) -> GameError,
    ) -> Result<JoinReceipt, GameError> {
        if participant.is_connected() {
            return Err(taken(participant.name.clone()));
        }
        participant.connection = Some(connection);
        Ok(JoinReceipt {
            participant: participant.to_ref(),
            token: participant.token.clone(),
            reconnected: true,
        })
    }

    /// Rebinds an existing participant to a new connection.
    ///
    /// # Errors
    /// [`GameError::ParticipantNotFound`] for an unknown id.
    pub fn reconnect(
        &mut self,
        id: ParticipantId,
        connection: ConnectionId,
    ) -> Result<&Participant, GameError> {
        let participant = self
            .get_mut(id)
            .ok_or(GameError::ParticipantNotFound(id))?;
        participant.connection = Some(connection);
        Ok(participant)
    }

    /// Clears the binding for `connection`. Alive status is untouched.
    ///
    /// # Errors
    /// [`GameError::ConnectionNotFound`] if nobody is bound to it.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<&Participant, GameError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.connection == Some(connection))
            .ok_or(GameError::ConnectionNotFound(connection))?;
        participant.connection = None;
        Ok(participant)
    }

    /// Marks a living participant as out.
    pub(crate) fn eliminate(&mut self, id: ParticipantId) -> Result<&Participant, GameError> {
        let participant = self
            .get_mut(id)
            .ok_or(GameError::ParticipantNotFound(id))?;
        if !participant.alive {
            return Err(GameError::AlreadyEliminated(id));
        }
        participant.alive = false;
        Ok(participant)
    }

    pub(crate) fn assign(&mut self, id: ParticipantId, assignment: Assignment) {
        if let Some(participant) = self.get_mut(id) {
            participant.assignment = Some(assignment);
        }
    }

    pub(crate) fn mark_voted(&mut self, id: ParticipantId) {
        if let Some(participant) = self.get_mut(id) {
            participant.has_voted = true;
        }
    }

    pub(crate) fn clear_vote(&mut self, id: ParticipantId) {
        if let Some(participant) = self.get_mut(id) {
            participant.has_voted = false;
        }
    }

    /// Drops every assignment and vote flag.
    pub(crate) fn clear_round_state(&mut self) {
        for participant in &mut self.participants {
            participant.assignment = None;
            participant.has_voted = false;
        }
    }

    /// Brings everyone back for a fresh game.
    pub(crate) fn revive_all(&mut self) {
        self.clear_round_state();
        for participant in &mut self.participants {
            participant.alive = true;
        }
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// The participant currently bound to `connection`, if any.
    pub fn by_connection(&self, connection: ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.connection == Some(connection))
    }

    fn position_by_token(&self, token: &SeatToken) -> Option<usize> {
        self.participants.iter().position(|p| &p.token == token)
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.participants
            .iter()
            .position(|p| p.name.to_lowercase() == wanted)
    }

    /// Everyone, in join order.
    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    pub fn alive(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn roster_with(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for (i, name) in names.iter().enumerate() {
            roster.join(name, None, conn(i as u64 + 1), true).unwrap();
        }
        roster
    }

    #[test]
    fn test_join_new_assigns_sequential_ids() {
        let roster = roster_with(&["Ana", "Ben", "Cy"]);
        let ids: Vec<u64> = roster.all().iter().map(|p| p.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(roster.alive_count(), 3);
    }

    #[test]
    fn test_join_trims_name() {
        let mut roster = Roster::new();
        let receipt = roster.join("  Ana  ", None, conn(1), true).unwrap();
        assert_eq!(receipt.participant.name, "Ana");
        assert!(!receipt.reconnected);
    }

    #[test]
    fn test_join_connected_name_taken_case_insensitive() {
        let mut roster = roster_with(&["Ana"]);
        let err = roster.join("ANA", None, conn(9), true).unwrap_err();
        assert_eq!(err, GameError::NameTaken("Ana".into()));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_join_disconnected_name_reconnects_after_start() {
        let mut roster = roster_with(&["Ana", "Ben"]);
        roster.disconnect(conn(1)).unwrap();

        let receipt = roster.join("ana", None, conn(7), false).unwrap();
        assert!(receipt.reconnected);
        assert_eq!(receipt.participant.id, ParticipantId(1));
        assert_eq!(roster.by_connection(conn(7)).unwrap().name(), "Ana");
    }

    #[test]
    fn test_join_new_hands_out_distinct_tokens() {
        let roster = roster_with(&["Ana", "Ben", "Cy"]);
        let tokens: Vec<&SeatToken> = roster.all().iter().map(|p| p.token()).collect();
        assert_ne!(tokens[0], tokens[1]);
        assert_ne!(tokens[1], tokens[2]);
        assert_ne!(tokens[0], tokens[2]);
        assert!(tokens.iter().all(|t| t.as_str().len() == 16));
    }

    #[test]
    fn test_join_claimed_token_connected_rejected() {
        let mut roster = roster_with(&["Ana"]);
        let token = roster.get(ParticipantId(1)).unwrap().token().clone();

        let err = roster
            .join("whatever", Some(&token), conn(5), false)
            .unwrap_err();

        assert_eq!(err, GameError::SeatTaken("Ana".into()));
        assert_eq!(roster.get(ParticipantId(1)).unwrap().connection(), Some(conn(1)));
    }

    #[test]
    fn test_join_claimed_token_disconnected_rebinds_in_any_phase() {
        let mut roster = roster_with(&["Ana"]);
        let token = roster.get(ParticipantId(1)).unwrap().token().clone();
        roster.disconnect(conn(1)).unwrap();

        let receipt = roster
            .join("renamed", Some(&token), conn(5), false)
            .unwrap();

        assert!(receipt.reconnected);
        assert_eq!(receipt.participant.id, ParticipantId(1));
        assert_eq!(receipt.token, token);
        assert_eq!(roster.get(ParticipantId(1)).unwrap().connection(), Some(conn(5)));
    }

    #[test]
    fn test_join_unknown_claimed_token_falls_back_to_name() {
        let mut roster = Roster::new();
        let stale = SeatToken::from_bits(99);
        let receipt = roster.join("Ana", Some(&stale), conn(1), true).unwrap();
        assert!(!receipt.reconnected);
        assert_eq!(receipt.participant.id, ParticipantId(1));
        assert_ne!(receipt.token, stale);
    }

    #[test]
    fn test_join_new_after_start_rejected() {
        let mut roster = roster_with(&["Ana"]);
        let err = roster.join("Ben", None, conn(2), false).unwrap_err();
        assert_eq!(err, GameError::GameAlreadyStarted);
    }

    #[test]
    fn test_join_invalid_names_rejected() {
        let mut roster = Roster::new();
        assert!(matches!(
            roster.join("   ", None, conn(1), true),
            Err(GameError::InvalidName { .. })
        ));
        let long = "x".repeat(MAX_NAME_CHARS + 1);
        assert!(matches!(
            roster.join(&long, None, conn(1), true),
            Err(GameError::InvalidName { .. })
        ));
        let exact = "é".repeat(MAX_NAME_CHARS);
        assert!(roster.join(&exact, None, conn(1), true).is_ok());
    }

    #[test]
    fn test_disconnect_keeps_alive() {
        let mut roster = roster_with(&["Ana"]);
        let participant = roster.disconnect(conn(1)).unwrap();
        assert!(participant.is_alive());
        assert!(!participant.is_connected());
        assert_eq!(
            roster.disconnect(conn(1)).unwrap_err(),
            GameError::ConnectionNotFound(conn(1))
        );
    }

    #[test]
    fn test_reconnect_unknown_id_not_found() {
        let mut roster = Roster::new();
        assert_eq!(
            roster.reconnect(ParticipantId(4), conn(1)).unwrap_err(),
            GameError::ParticipantNotFound(ParticipantId(4))
        );
    }

    #[test]
    fn test_eliminate_twice_rejected() {
        let mut roster = roster_with(&["Ana", "Ben"]);
        roster.eliminate(ParticipantId(1)).unwrap();
        assert_eq!(roster.alive_count(), 1);
        assert_eq!(
            roster.eliminate(ParticipantId(1)).unwrap_err(),
            GameError::AlreadyEliminated(ParticipantId(1))
        );
    }

    #[test]
    fn test_revive_all_clears_round_state() {
        let mut roster = roster_with(&["Ana", "Ben"]);
        roster.assign(
            ParticipantId(1),
            Assignment {
                side: Side::Imposter,
                word: "Cat".into(),
            },
        );
        roster.mark_voted(ParticipantId(2));
        roster.eliminate(ParticipantId(2)).unwrap();

        roster.revive_all();

        assert_eq!(roster.alive_count(), 2);
        assert!(roster.all().iter().all(|p| p.assignment().is_none() && !p.has_voted()));
    }
}
