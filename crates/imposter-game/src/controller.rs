//! Session commands and the phase rules that gate them.
//!
//! Each command either fully applies or returns a [`GameError`] with the
//! session untouched. Phase checks always come first, before any other
//! validation or mutation.

use imposter_protocol::{Audience, ConnectionId, ParticipantId, SeatToken};
use serde::{Deserialize, Serialize};

use crate::ballot::{PendingTieBreak, TallyResult, TieBreakResult, VoteReceipt};
use crate::event::{EliminationCause, EliminationRecord, EliminationResult, GameEvent};
use crate::roster::{JoinReceipt, ParticipantRef, Side};
use crate::round::{
    self, ClueOrder, ClueStep, RoundSetup, FINAL_ROUND_ALIVE, GAME_OVER_ALIVE, MIN_PLAYERS,
};
use crate::{win, GameError, Phase, Session, Settings, SettingsUpdate};

/// Everything that can be asked of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join {
        name: String,
        token: Option<SeatToken>,
        connection: ConnectionId,
    },
    Reconnect {
        participant_id: ParticipantId,
        connection: ConnectionId,
    },
    Disconnect {
        connection: ConnectionId,
    },
    Kick {
        participant_id: ParticipantId,
    },
    StartRound,
    StartClueCircle,
    AdvanceClue,
    StartDiscussion,
    StartVoting,
    CastVote {
        voter: ParticipantId,
        target: ParticipantId,
    },
    CloseVoting,
    ResolveTieBreak,
    ExecuteEliminations,
    Reset,
    UpdateSettings(SettingsUpdate),
}

impl Command {
    /// The command's name as used in logs and `wrong_phase` errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Reconnect { .. } => "reconnect",
            Self::Disconnect { .. } => "disconnect",
            Self::Kick { .. } => "kick",
            Self::StartRound => "start_round",
            Self::StartClueCircle => "start_clue_circle",
            Self::AdvanceClue => "advance_clue",
            Self::StartDiscussion => "start_discussion",
            Self::StartVoting => "start_voting",
            Self::CastVote { .. } => "cast_vote",
            Self::CloseVoting => "close_voting",
            Self::ResolveTieBreak => "resolve_tie_break",
            Self::ExecuteEliminations => "execute_eliminations",
            Self::Reset => "reset",
            Self::UpdateSettings(_) => "update_settings",
        }
    }
}

/// The typed answer to a successful [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Joined { receipt: JoinReceipt },
    Reconnected { participant: ParticipantRef },
    Disconnected { participant: ParticipantRef },
    Kicked { record: EliminationRecord },
    RoundStarted { setup: RoundSetup },
    ClueCircleStarted { order: ClueOrder },
    ClueAdvanced { step: ClueStep },
    DiscussionStarted { duration_secs: u32 },
    VotingStarted { duration_secs: u32 },
    VoteAccepted { receipt: VoteReceipt },
    VotesTallied { result: TallyResult },
    TieBreakResolved { result: TieBreakResult },
    EliminationsExecuted { result: EliminationResult },
    /// `applied` is `false` when the session was already in the lobby.
    Reset { applied: bool },
    SettingsUpdated { settings: Settings },
}

impl Session {
    /// Runs one command.
    pub fn apply(&mut self, command: Command) -> Result<Reply, GameError> {
        let command_name = command.name();
        let result = match command {
            Command::Join {
                name,
                token,
                connection,
            } => self
                .join(&name, token.as_ref(), connection)
                .map(|receipt| Reply::Joined { receipt }),
            Command::Reconnect {
                participant_id,
                connection,
            } => self
                .reconnect(participant_id, connection)
                .map(|participant| Reply::Reconnected { participant }),
            Command::Disconnect { connection } => self
                .disconnect(connection)
                .map(|participant| Reply::Disconnected { participant }),
            Command::Kick { participant_id } => self
                .kick(participant_id)
                .map(|record| Reply::Kicked { record }),
            Command::StartRound => self.start_round().map(|setup| Reply::RoundStarted { setup }),
            Command::StartClueCircle => self
                .start_clue_circle()
                .map(|order| Reply::ClueCircleStarted { order }),
            Command::AdvanceClue => self.advance_clue().map(|step| Reply::ClueAdvanced { step }),
            Command::StartDiscussion => self
                .start_discussion()
                .map(|duration_secs| Reply::DiscussionStarted { duration_secs }),
            Command::StartVoting => self
                .start_voting()
                .map(|duration_secs| Reply::VotingStarted { duration_secs }),
            Command::CastVote { voter, target } => self
                .cast_vote(voter, target)
                .map(|receipt| Reply::VoteAccepted { receipt }),
            Command::CloseVoting => self.close_voting().map(|result| Reply::VotesTallied { result }),
            Command::ResolveTieBreak => self
                .resolve_tie_break()
                .map(|result| Reply::TieBreakResolved { result }),
            Command::ExecuteEliminations => self
                .execute_eliminations()
                .map(|result| Reply::EliminationsExecuted { result }),
            Command::Reset => Ok(Reply::Reset {
                applied: self.reset(),
            }),
            Command::UpdateSettings(update) => self
                .update_settings(update)
                .map(|settings| Reply::SettingsUpdated { settings }),
        };

        if let Err(err) = &result {
            tracing::debug!(
                room = %self.code,
                phase = %self.phase,
                command = command_name,
                reason = err.reason(),
                "command rejected"
            );
        }
        result
    }

    fn require_phase(&self, command: &'static str, phase: Phase) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                command,
                phase: self.phase,
            })
        }
    }

    fn require_transition(&self, command: &'static str, target: Phase) -> Result<(), GameError> {
        if self.phase.can_transition_to(target) {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                command,
                phase: self.phase,
            })
        }
    }

    /// Sends to the display and the moderator.
    fn emit_public(&mut self, event: GameEvent) {
        self.emit(Audience::Display, event.clone());
        self.emit(Audience::Operator, event);
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Joins a new player or rebinds a returning one. See
    /// [`Roster::join`](crate::Roster::join) for the matching rules.
    pub fn join(
        &mut self,
        name: &str,
        claimed: Option<&SeatToken>,
        connection: ConnectionId,
    ) -> Result<JoinReceipt, GameError> {
        let receipt = self
            .roster
            .join(name, claimed, connection, self.phase.is_joinable())?;

        let participant = receipt.participant.clone();
        if receipt.reconnected {
            tracing::info!(room = %self.code, participant = %participant.id, "player reconnected");
            self.emit_public(GameEvent::PlayerReconnected { participant });
        } else {
            tracing::info!(
                room = %self.code,
                participant = %participant.id,
                name = %participant.name,
                "player joined"
            );
            let total = self.roster.len();
            self.emit_public(GameEvent::PlayerJoined { participant, total });
        }
        Ok(receipt)
    }

    pub fn reconnect(
        &mut self,
        id: ParticipantId,
        connection: ConnectionId,
    ) -> Result<ParticipantRef, GameError> {
        let participant = self.roster.reconnect(id, connection)?.to_ref();
        tracing::info!(room = %self.code, participant = %id, "player reconnected");
        self.emit_public(GameEvent::PlayerReconnected {
            participant: participant.clone(),
        });
        Ok(participant)
    }

    /// Unbinds a connection. The participant stays in the game.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<ParticipantRef, GameError> {
        let participant = self.roster.disconnect(connection)?.to_ref();
        tracing::info!(room = %self.code, participant = %participant.id, "player disconnected");
        self.emit_public(GameEvent::PlayerDisconnected {
            participant: participant.clone(),
        });
        Ok(participant)
    }

    /// Removes a player from play immediately, in any phase.
    ///
    /// Their votes, cast or received, are dropped; anyone whose vote is
    /// dropped may vote again. They also leave a pending tie-break, which
    /// then draws at most as many as remain and is cancelled if nobody is
    /// left in it.
    pub fn kick(&mut self, id: ParticipantId) -> Result<EliminationRecord, GameError> {
        let participant = self.roster.eliminate(id)?;
        let side = participant.side();
        let record = EliminationRecord {
            round: self.round,
            id,
            name: participant.name().to_string(),
            was_imposter: participant.is_imposter(),
            word: participant.word().map(str::to_string),
            cause: EliminationCause::Kick,
        };

        for voter in self.ballot.purge(id) {
            self.roster.clear_vote(voter);
        }
        if let Some(pending) = &mut self.tie_break {
            pending.candidates.retain(|candidate| *candidate != id);
            pending.slots = pending.slots.min(pending.candidates.len());
            if pending.candidates.is_empty() {
                self.tie_break = None;
            }
        }
        self.history.push(record.clone());

        tracing::info!(room = %self.code, participant = %id, phase = %self.phase, "player kicked");
        self.emit_public(GameEvent::PlayerKicked {
            participant: ParticipantRef {
                id,
                name: record.name.clone(),
            },
        });
        self.emit(
            Audience::Participant(id),
            GameEvent::YouWereEliminated {
                kicked: true,
                side,
                word: record.word.clone(),
            },
        );
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Round flow
    // -----------------------------------------------------------------------

    /// Deals a new round: picks a word pair, assigns roles, and shuffles
    /// the clue order. Legal from the lobby and after an elimination.
    pub fn start_round(&mut self) -> Result<RoundSetup, GameError> {
        self.require_transition("start_round", Phase::WordReveal)?;
        let alive = self.roster.alive_count();
        if alive < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                alive,
                required: MIN_PLAYERS,
            });
        }

        self.round += 1;
        self.ballot.clear();
        self.confirmed.clear();
        self.tie_break = None;
        self.clue_cursor = 0;

        let imposters = round::imposter_count(alive);
        let pair = self
            .words
            .next_pair(self.round, &self.used_pairs, &mut self.rng);
        self.used_pairs.push(pair.key.clone());

        self.roster.clear_round_state();
        round::assign_roles(&mut self.roster, &pair, imposters, &mut self.rng);
        self.turn_order = round::turn_order(&self.roster, &mut self.rng);

        let setup = RoundSetup {
            round: self.round,
            alive_count: alive,
            imposter_count: imposters,
            difficulty: pair.difficulty,
            is_final_round: alive <= FINAL_ROUND_ALIVE,
        };
        self.word_pair = Some(pair);
        self.phase = Phase::WordReveal;

        tracing::info!(
            room = %self.code,
            round = self.round,
            alive,
            imposters,
            "round started"
        );

        let reveal_secs = self.settings.word_reveal_secs;
        self.emit_public(GameEvent::RoundStarted {
            setup: setup.clone(),
            reveal_secs,
        });
        let deals: Vec<(ParticipantId, String)> = self
            .roster
            .alive()
            .filter_map(|p| p.word().map(|word| (p.id(), word.to_string())))
            .collect();
        for (id, word) in deals {
            self.emit(
                Audience::Participant(id),
                GameEvent::WordAssigned {
                    round: self.round,
                    word,
                    reveal_secs,
                },
            );
        }
        Ok(setup)
    }

    pub fn start_clue_circle(&mut self) -> Result<ClueOrder, GameError> {
        self.require_transition("start_clue_circle", Phase::ClueCircle)?;
        self.clue_cursor = 0;
        self.phase = Phase::ClueCircle;

        let order = ClueOrder {
            order: self.refs(&self.turn_order),
            current_index: 0,
        };
        self.emit(
            Audience::Everyone,
            GameEvent::ClueCircleStarted {
                order: order.clone(),
                clue_secs: self.settings.clue_secs_per_speaker,
            },
        );
        Ok(order)
    }

    /// Moves to the next speaker. Stays [`ClueStep::Done`] once everyone
    /// has spoken.
    pub fn advance_clue(&mut self) -> Result<ClueStep, GameError> {
        self.require_phase("advance_clue", Phase::ClueCircle)?;
        self.clue_cursor = (self.clue_cursor + 1).min(self.turn_order.len());

        let step = self
            .turn_order
            .get(self.clue_cursor)
            .and_then(|id| self.roster.get(*id))
            .map_or(ClueStep::Done, |p| ClueStep::Speaker {
                index: self.clue_cursor,
                participant: p.to_ref(),
            });
        self.emit(
            Audience::Everyone,
            GameEvent::ClueAdvanced {
                step: step.clone(),
                clue_secs: self.settings.clue_secs_per_speaker,
            },
        );
        Ok(step)
    }

    /// Returns the discussion length in seconds.
    pub fn start_discussion(&mut self) -> Result<u32, GameError> {
        self.require_transition("start_discussion", Phase::Discussion)?;
        self.phase = Phase::Discussion;

        let duration_secs = self.settings.discussion_secs;
        self.emit(
            Audience::Everyone,
            GameEvent::DiscussionStarted { duration_secs },
        );
        Ok(duration_secs)
    }

    /// Opens the vote. Each alive player is privately sent who they may
    /// vote for. Returns the voting time in seconds.
    pub fn start_voting(&mut self) -> Result<u32, GameError> {
        self.require_transition("start_voting", Phase::Voting)?;
        self.phase = Phase::Voting;

        let duration_secs = self.settings.voting_secs;
        self.emit_public(GameEvent::VotingStarted { duration_secs });

        let alive: Vec<ParticipantRef> = self.roster.alive().map(|p| p.to_ref()).collect();
        for voter in &alive {
            let candidates = alive.iter().filter(|c| c.id != voter.id).cloned().collect();
            self.emit(
                Audience::Participant(voter.id),
                GameEvent::VotingOpened {
                    candidates,
                    duration_secs,
                },
            );
        }
        Ok(duration_secs)
    }

    pub fn cast_vote(
        &mut self,
        voter: ParticipantId,
        target: ParticipantId,
    ) -> Result<VoteReceipt, GameError> {
        self.require_phase("cast_vote", Phase::Voting)?;
        let receipt = self.ballot.cast(&mut self.roster, voter, target)?;

        tracing::debug!(room = %self.code, participant = %voter, "vote cast");
        self.emit_public(GameEvent::VoteProgress { receipt });
        Ok(receipt)
    }

    /// Closes the vote and tallies it.
    pub fn close_voting(&mut self) -> Result<TallyResult, GameError> {
        self.require_transition("close_voting", Phase::Results)?;

        let slots = round::imposter_count(self.roster.alive_count());
        let result = self.ballot.tally(&self.roster, slots);
        self.confirmed = result
            .eliminated
            .iter()
            .map(|p| (p.id, EliminationCause::Vote))
            .collect();
        self.tie_break = result.needs_tie_break().then(|| PendingTieBreak {
            candidates: result.tie_break_candidates.iter().map(|p| p.id).collect(),
            slots: result.slots_needed,
        });
        self.phase = Phase::Results;

        tracing::info!(
            room = %self.code,
            round = self.round,
            votes = self.ballot.len(),
            confirmed = self.confirmed.len(),
            tie_break = result.needs_tie_break(),
            "voting closed"
        );
        self.emit(
            Audience::Operator,
            GameEvent::VotesTallied {
                result: result.clone(),
            },
        );
        self.emit(
            Audience::Display,
            GameEvent::VoteResults {
                result: result.public(),
            },
        );
        Ok(result)
    }

    /// Randomly fills the open slots from the tied candidates.
    pub fn resolve_tie_break(&mut self) -> Result<TieBreakResult, GameError> {
        self.require_transition("resolve_tie_break", Phase::TieBreak)?;
        let pending = self.tie_break.take().ok_or(GameError::NoTieBreakPending)?;

        let picks = pending.resolve(&mut self.rng);
        self.confirmed
            .extend(picks.iter().map(|id| (*id, EliminationCause::TieBreak)));
        self.phase = Phase::TieBreak;

        let result = TieBreakResult {
            candidates: self.refs(&pending.candidates),
            eliminated: self.refs(&picks),
        };
        tracing::info!(room = %self.code, picked = picks.len(), "tie-break resolved");
        self.emit_public(GameEvent::TieBreakResolved {
            result: result.clone(),
        });
        Ok(result)
    }

    /// Takes everyone confirmed this round out of the game, then checks
    /// whether the game is over.
    pub fn execute_eliminations(&mut self) -> Result<EliminationResult, GameError> {
        self.require_transition("execute_eliminations", Phase::Elimination)?;
        if self.tie_break.is_some() {
            return Err(GameError::TieBreakPending);
        }

        let mut eliminated = Vec::new();
        for (id, cause) in self.confirmed.clone() {
            // Someone kicked since the tally is already out.
            let Ok(participant) = self.roster.eliminate(id) else {
                continue;
            };
            let side = participant.side();
            eliminated.push((
                EliminationRecord {
                    round: self.round,
                    id,
                    name: participant.name().to_string(),
                    was_imposter: participant.is_imposter(),
                    word: participant.word().map(str::to_string),
                    cause,
                },
                side,
            ));
        }

        for (record, side) in &eliminated {
            self.history.push(record.clone());
            self.emit(
                Audience::Participant(record.id),
                GameEvent::YouWereEliminated {
                    kicked: false,
                    side: *side,
                    word: record.word.clone(),
                },
            );
        }

        let alive_count = self.roster.alive_count();
        let outcome = (alive_count <= GAME_OVER_ALIVE)
            .then(|| win::evaluate(&self.roster, &self.confirmed()));
        self.phase = if outcome.is_some() {
            Phase::GameOver
        } else {
            Phase::Elimination
        };

        let result = EliminationResult {
            eliminated: eliminated.into_iter().map(|(record, _)| record).collect(),
            alive_count,
            outcome: outcome.clone(),
        };
        tracing::info!(
            room = %self.code,
            round = self.round,
            eliminated = result.eliminated.len(),
            alive = alive_count,
            "eliminations executed"
        );
        self.emit_public(GameEvent::EliminationsExecuted {
            result: result.clone(),
            word_pair: self.word_pair.clone(),
        });

        if let Some(outcome) = outcome {
            let winner = match outcome.winner {
                Side::Majority => "majority",
                Side::Imposter => "imposter",
            };
            tracing::info!(room = %self.code, round = self.round, winner, "game over");
            self.emit(Audience::Everyone, GameEvent::GameOver { outcome });
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Housekeeping
    // -----------------------------------------------------------------------

    /// Back to the lobby with everyone alive. Names, ids, and settings are
    /// kept. Returns `false` if already in the lobby, in which case nothing
    /// changes.
    pub fn reset(&mut self) -> bool {
        if self.phase == Phase::Lobby {
            return false;
        }

        self.phase = Phase::Lobby;
        self.round = 0;
        self.word_pair = None;
        self.used_pairs.clear();
        self.ballot.clear();
        self.confirmed.clear();
        self.tie_break = None;
        self.history.clear();
        self.turn_order.clear();
        self.clue_cursor = 0;
        self.roster.revive_all();

        tracing::info!(room = %self.code, "game reset");
        self.emit(Audience::Everyone, GameEvent::GameReset);
        true
    }

    /// Changes timings. Allowed in any phase; takes effect from the next
    /// timed step.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<Settings, GameError> {
        let settings = self.settings.apply(update)?;
        self.emit(Audience::Everyone, GameEvent::SettingsChanged { settings });
        Ok(settings)
    }
}
