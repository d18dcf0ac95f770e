//! The game session state machine for Find The Imposter.
//!
//! Everything in this crate is synchronous and does no I/O. A [`Session`]
//! takes a [`Command`], checks it against the current [`Phase`], mutates its
//! state, and returns a typed [`Reply`]. Anything other clients should hear
//! about is queued as `(Audience, GameEvent)` pairs that the caller drains
//! with [`Session::take_events`].
//!
//! # Components
//!
//! - [`code`]: room code generation
//! - [`Roster`]: who is in the room and their per-round status
//! - [`round`]: imposter count, role assignment, clue turn order
//! - [`BallotBox`]: vote ledger, tally, tie-break
//! - [`win`]: who won once the room is down to two
//! - [`WordCatalog`]: the built-in [`WordPairProvider`]
//! - [`view`]: what the display, the moderator, and each player may see
//!
//! # Phases
//!
//! ```text
//! LOBBY → WORD_REVEAL → CLUE_CIRCLE → DISCUSSION → VOTING → RESULTS
//!       → [TIE_BREAK] → ELIMINATION → WORD_REVEAL (next round) | GAME_OVER
//! ```

pub mod ballot;
pub mod code;
mod controller;
mod error;
mod event;
mod phase;
pub mod roster;
pub mod round;
mod session;
mod settings;
pub mod view;
pub mod win;
mod words;

pub use ballot::{
    BallotBox, PendingTieBreak, PublicTally, TallyEntry, TallyResult, TieBreakResult, VoteCount,
    VoteReceipt,
};
pub use controller::{Command, Reply};
pub use error::{GameError, VoteRejection};
pub use event::{EliminationCause, EliminationRecord, EliminationResult, GameEvent};
pub use phase::Phase;
pub use roster::{Assignment, JoinReceipt, Participant, ParticipantRef, Roster, Side};
pub use round::{ClueOrder, ClueStep, RoundSetup};
pub use session::Session;
pub use settings::{Settings, SettingsUpdate};
pub use view::{View, Viewer};
pub use win::GameOutcome;
pub use words::{Difficulty, WordCatalog, WordPair, WordPairProvider};
