//! Moderator-tunable timings.
//!
//! The core never runs timers. These durations are handed to clients in
//! events so the display can count down, and the moderator's console
//! issues the next command when a countdown ends.

use serde::{Deserialize, Serialize};

use crate::GameError;

/// Timing settings for a session. All values are seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// How long players get to read their word.
    pub word_reveal_secs: u32,

    /// Time per speaker in the clue circle.
    pub clue_secs_per_speaker: u32,

    pub discussion_secs: u32,

    pub voting_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            word_reveal_secs: 10,
            clue_secs_per_speaker: 5,
            discussion_secs: 180,
            voting_secs: 120,
        }
    }
}

/// A partial settings change. Missing keys keep their current value and
/// unknown keys are ignored when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub word_reveal_secs: Option<u32>,
    pub clue_secs_per_speaker: Option<u32>,
    pub discussion_secs: Option<u32>,
    pub voting_secs: Option<u32>,
}

impl Settings {
    /// Applies `update` all-or-nothing.
    ///
    /// # Errors
    /// [`GameError::InvalidSetting`] naming the first zero value. Nothing
    /// is changed in that case.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<Settings, GameError> {
        let fields = [
            ("word_reveal_secs", update.word_reveal_secs),
            ("clue_secs_per_speaker", update.clue_secs_per_speaker),
            ("discussion_secs", update.discussion_secs),
            ("voting_secs", update.voting_secs),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| *value == Some(0)) {
            return Err(GameError::InvalidSetting(*name));
        }

        if let Some(v) = update.word_reveal_secs {
            self.word_reveal_secs = v;
        }
        if let Some(v) = update.clue_secs_per_speaker {
            self.clue_secs_per_speaker = v;
        }
        if let Some(v) = update.discussion_secs {
            self.discussion_secs = v;
        }
        if let Some(v) = update.voting_secs {
            self.voting_secs = v;
        }
        Ok(*self)
    }
}
