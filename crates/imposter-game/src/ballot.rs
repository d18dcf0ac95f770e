//! Votes, the tally, and tie-breaks.
//!
//! The tally fills a fixed number of elimination slots from the top of the
//! vote count down. Players with equal counts are only ever taken as a
//! whole group; a group that doesn't fit in the remaining slots becomes a
//! tie-break, and the moderator triggers a random pick among its members.

use imposter_protocol::ParticipantId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::VoteRejection;
use crate::roster::{ParticipantRef, Roster};

/// Progress after an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// Votes cast so far this round.
    pub votes_cast: usize,
    /// Alive players, i.e. everyone who may vote.
    pub eligible: usize,
}

/// One row of the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub participant: ParticipantRef,
    pub votes: usize,
    pub was_imposter: bool,
}

/// The full result of closing a vote. Contains roles; see
/// [`public`](TallyResult::public) for the version spectators get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    /// Sorted by votes, descending.
    pub tally: Vec<TallyEntry>,
    /// Confirmed by vote count alone.
    pub eliminated: Vec<ParticipantRef>,
    /// Tied for the last slots. Empty if none.
    pub tie_break_candidates: Vec<ParticipantRef>,
    /// How many of the candidates the tie-break will take.
    pub slots_needed: usize,
}

/// A tally row without the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub participant: ParticipantRef,
    pub votes: usize,
}

/// [`TallyResult`] with roles stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicTally {
    pub tally: Vec<VoteCount>,
    pub eliminated: Vec<ParticipantRef>,
    pub tie_break_candidates: Vec<ParticipantRef>,
    pub slots_needed: usize,
}

impl TallyResult {
    pub fn needs_tie_break(&self) -> bool {
        !self.tie_break_candidates.is_empty()
    }

    pub fn public(&self) -> PublicTally {
        PublicTally {
            tally: self
                .tally
                .iter()
                .map(|entry| VoteCount {
                    participant: entry.participant.clone(),
                    votes: entry.votes,
                })
                .collect(),
            eliminated: self.eliminated.clone(),
            tie_break_candidates: self.tie_break_candidates.clone(),
            slots_needed: self.slots_needed,
        }
    }
}

/// A tie the moderator still has to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTieBreak {
    pub candidates: Vec<ParticipantId>,
    pub slots: usize,
}

impl PendingTieBreak {
    /// Picks `slots` distinct candidates uniformly at random.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ParticipantId> {
        let mut candidates = self.candidates.clone();
        candidates.shuffle(rng);
        candidates.truncate(self.slots);
        candidates
    }
}

/// What the tie-break picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakResult {
    pub candidates: Vec<ParticipantRef>,
    pub eliminated: Vec<ParticipantRef>,
}

/// The vote ledger for one round, in the order votes arrived.
#[derive(Debug, Clone, Default)]
pub struct BallotBox {
    votes: Vec<(ParticipantId, ParticipantId)>,
}

impl BallotBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `voter`'s vote for `target`.
    ///
    /// # Errors
    /// The first [`VoteRejection`] that applies, checked in declaration
    /// order. A rejected vote leaves the ledger untouched.
    pub fn cast(
        &mut self,
        roster: &mut Roster,
        voter: ParticipantId,
        target: ParticipantId,
    ) -> Result<VoteReceipt, VoteRejection> {
        let (Some(v), Some(t)) = (roster.get(voter), roster.get(target)) else {
            return Err(VoteRejection::UnknownParticipant);
        };
        if !v.is_alive() {
            return Err(VoteRejection::VoterEliminated);
        }
        if !t.is_alive() {
            return Err(VoteRejection::TargetEliminated);
        }
        if voter == target {
            return Err(VoteRejection::SelfVote);
        }
        if v.has_voted() || self.has_voted(voter) {
            return Err(VoteRejection::AlreadyVoted);
        }

        self.votes.push((voter, target));
        roster.mark_voted(voter);
        Ok(VoteReceipt {
            votes_cast: self.votes.len(),
            eligible: roster.alive_count(),
        })
    }

    pub fn has_voted(&self, voter: ParticipantId) -> bool {
        self.votes.iter().any(|(v, _)| *v == voter)
    }

    /// `(voter, target)` pairs in arrival order.
    pub fn votes(&self) -> &[(ParticipantId, ParticipantId)] {
        &self.votes
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.votes.clear();
    }

    /// Drops every vote cast by or for `id`. Returns the other voters whose
    /// vote went with it.
    pub(crate) fn purge(&mut self, id: ParticipantId) -> Vec<ParticipantId> {
        let orphaned = self
            .votes
            .iter()
            .filter(|(voter, target)| *target == id && *voter != id)
            .map(|(voter, _)| *voter)
            .collect();
        self.votes.retain(|(voter, target)| *voter != id && *target != id);
        orphaned
    }

    /// Counts the votes and fills `slots` elimination places.
    ///
    /// Every alive participant appears in the tally, with zero if nobody
    /// picked them. Equal counts keep join order.
    pub fn tally(&self, roster: &Roster, slots: usize) -> TallyResult {
        let mut tally: Vec<TallyEntry> = roster
            .alive()
            .map(|p| TallyEntry {
                participant: p.to_ref(),
                votes: 0,
                was_imposter: p.is_imposter(),
            })
            .collect();
        for (_, target) in &self.votes {
            if let Some(entry) = tally.iter_mut().find(|e| e.participant.id == *target) {
                entry.votes += 1;
            }
        }
        tally.sort_by(|a, b| b.votes.cmp(&a.votes));

        let mut remaining = slots;
        let mut eliminated = Vec::new();
        let mut tie_break_candidates = Vec::new();
        let mut start = 0;

        while remaining > 0 && start < tally.len() {
            let votes = tally[start].votes;
            let end = tally[start..]
                .iter()
                .position(|e| e.votes != votes)
                .map_or(tally.len(), |offset| start + offset);
            let group = &tally[start..end];

            if group.len() <= remaining {
                eliminated.extend(group.iter().map(|e| e.participant.clone()));
                remaining -= group.len();
                start = end;
            } else {
                tie_break_candidates = group.iter().map(|e| e.participant.clone()).collect();
                break;
            }
        }

        let slots_needed = if tie_break_candidates.is_empty() {
            0
        } else {
            remaining
        };
        TallyResult {
            tally,
            eliminated,
            tie_break_candidates,
            slots_needed,
        }
    }
}
