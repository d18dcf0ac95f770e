//! The per-room game state.

use imposter_protocol::{Audience, ParticipantId, RoomCode};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::ballot::{BallotBox, PendingTieBreak};
use crate::event::{EliminationCause, EliminationRecord, GameEvent};
use crate::roster::{ParticipantRef, Roster};
use crate::round::imposter_count;
use crate::view::{
    OperatorParticipant, OperatorView, ParticipantView, PublicParticipant, SpectatorView, View,
    Viewer,
};
use crate::words::{WordCatalog, WordPair, WordPairProvider};
use crate::{Phase, Settings};

/// One room's game.
///
/// Owned by exactly one task; every mutation goes through a `&mut self`
/// command method (see [`Session::apply`]). Events produced along the way
/// pile up until [`take_events`](Session::take_events) is called.
pub struct Session {
    pub(crate) code: RoomCode,
    pub(crate) phase: Phase,
    pub(crate) round: u32,
    pub(crate) roster: Roster,
    pub(crate) settings: Settings,
    pub(crate) word_pair: Option<WordPair>,
    pub(crate) used_pairs: Vec<String>,
    pub(crate) ballot: BallotBox,
    /// Confirmed for elimination this round, vote picks first.
    pub(crate) confirmed: Vec<(ParticipantId, EliminationCause)>,
    pub(crate) tie_break: Option<PendingTieBreak>,
    pub(crate) history: Vec<EliminationRecord>,
    pub(crate) turn_order: Vec<ParticipantId>,
    pub(crate) clue_cursor: usize,
    pub(crate) words: Box<dyn WordPairProvider>,
    pub(crate) rng: StdRng,
    pub(crate) events: Vec<(Audience, GameEvent)>,
}

impl Session {
    /// A fresh session in the lobby with default settings, the built-in
    /// word catalog, and an OS-seeded random source.
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            phase: Phase::Lobby,
            round: 0,
            roster: Roster::new(),
            settings: Settings::default(),
            word_pair: None,
            used_pairs: Vec::new(),
            ballot: BallotBox::new(),
            confirmed: Vec::new(),
            tie_break: None,
            history: Vec::new(),
            turn_order: Vec::new(),
            clue_cursor: 0,
            words: Box::new(WordCatalog),
            rng: StdRng::from_rng(&mut rand::rng()),
            events: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the word source.
    pub fn with_words(mut self, words: impl WordPairProvider + 'static) -> Self {
        self.words = Box::new(words);
        self
    }

    /// Makes shuffles and tie-breaks reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn code(&self) -> RoomCode {
        self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn word_pair(&self) -> Option<&WordPair> {
        self.word_pair.as_ref()
    }

    pub fn used_pairs(&self) -> &[String] {
        &self.used_pairs
    }

    pub fn ballot(&self) -> &BallotBox {
        &self.ballot
    }

    pub fn confirmed(&self) -> Vec<ParticipantId> {
        self.confirmed.iter().map(|(id, _)| *id).collect()
    }

    pub fn tie_break(&self) -> Option<&PendingTieBreak> {
        self.tie_break.as_ref()
    }

    pub fn history(&self) -> &[EliminationRecord] {
        &self.history
    }

    pub fn turn_order(&self) -> &[ParticipantId] {
        &self.turn_order
    }

    pub fn clue_cursor(&self) -> usize {
        self.clue_cursor
    }

    /// Drains the events queued since the last call.
    pub fn take_events(&mut self) -> Vec<(Audience, GameEvent)> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, audience: Audience, event: GameEvent) {
        self.events.push((audience, event));
    }

    pub(crate) fn refs(&self, ids: &[ParticipantId]) -> Vec<ParticipantRef> {
        ids.iter()
            .filter_map(|id| self.roster.get(*id))
            .map(|p| p.to_ref())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn view_for(&self, viewer: Viewer) -> Option<View> {
        match viewer {
            Viewer::Display => Some(View::Spectator(self.spectator_view())),
            Viewer::Operator => Some(View::Operator(self.operator_view())),
            Viewer::Participant(id) => self.participant_view(id).map(View::Participant),
        }
    }

    pub fn spectator_view(&self) -> SpectatorView {
        let slots = if self.phase == Phase::Lobby {
            0
        } else {
            imposter_count(self.roster.alive_count())
        };

        SpectatorView {
            room: self.code,
            phase: self.phase,
            round: self.round,
            settings: self.settings,
            alive_count: self.roster.alive_count(),
            total_count: self.roster.len(),
            imposters_this_round: slots,
            elimination_slots: slots,
            participants: self
                .roster
                .all()
                .iter()
                .map(|p| PublicParticipant {
                    id: p.id(),
                    name: p.name().to_string(),
                    alive: p.is_alive(),
                    connected: p.is_connected(),
                    has_voted: p.has_voted(),
                })
                .collect(),
            turn_order: self.refs(&self.turn_order),
            current_speaker_index: self.clue_cursor,
            difficulty: self.word_pair.as_ref().map(|pair| pair.difficulty),
            history: self.history.clone(),
        }
    }

    pub fn operator_view(&self) -> OperatorView {
        let spectator = self.spectator_view();
        let secrets = spectator
            .participants
            .iter()
            .cloned()
            .map(|public| {
                let participant = self.roster.get(public.id);
                OperatorParticipant {
                    side: participant.and_then(|p| p.side()),
                    word: participant.and_then(|p| p.word()).map(str::to_string),
                    public,
                }
            })
            .collect();

        OperatorView {
            spectator,
            secrets,
            word_pair: self.word_pair.clone(),
        }
    }

    /// `None` if `id` isn't in this room.
    pub fn participant_view(&self, id: ParticipantId) -> Option<ParticipantView> {
        let me = self.roster.get(id)?;
        Some(ParticipantView {
            room: self.code,
            phase: self.phase,
            round: self.round,
            settings: self.settings,
            me: me.to_ref(),
            alive: me.is_alive(),
            has_voted: me.has_voted(),
            alive_participants: self.roster.alive().map(|p| p.to_ref()).collect(),
            alive_count: self.roster.alive_count(),
            total_count: self.roster.len(),
        })
    }
}
