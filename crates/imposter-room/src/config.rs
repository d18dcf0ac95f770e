//! Room configuration.

use imposter_game::Settings;
use serde::{Deserialize, Serialize};

/// Configuration applied to every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Capacity of each room's command channel. When it fills up, senders
    /// wait.
    pub channel_size: usize,

    /// Timings a new room starts with.
    pub settings: Settings,

    /// How many random codes to try before giving up on creating a room.
    pub create_attempts: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            settings: Settings::default(),
            create_attempts: 32,
        }
    }
}
