//! Room registry: creates rooms under unique codes and tracks their handles.

use std::collections::HashMap;

use imposter_game::Session;
use imposter_game::code::generate_room_code;
use imposter_protocol::RoomCode;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle, RoomInfo};

/// All live rooms, keyed by code.
///
/// The server owns one of these behind a lock. Methods that touch the map
/// are synchronous, so callers can clone a handle, drop the lock, and only
/// then await the room.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    config: RoomConfig,
    rng: StdRng,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Reseeds code generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room under a fresh code and starts its actor.
    ///
    /// # Errors
    /// [`RoomError::CodesExhausted`] if every attempt hit a live code.
    pub fn create_room(&mut self) -> Result<RoomHandle, RoomError> {
        let attempts = self.config.create_attempts;
        let code = (0..attempts)
            .map(|_| generate_room_code(&mut self.rng))
            .find(|code| !self.rooms.contains_key(code))
            .ok_or(RoomError::CodesExhausted(attempts))?;

        let session = Session::new(code).with_settings(self.config.settings);
        let handle = spawn_room(session, self.config.channel_size);
        self.rooms.insert(code, handle.clone());
        tracing::info!(room = %code, rooms = self.rooms.len(), "room created");
        Ok(handle)
    }

    /// Returns a handle to a live room.
    pub fn get(&self, code: RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(&code)
            .cloned()
            .ok_or(RoomError::NotFound(code))
    }

    /// Unregisters a room and hands back its handle. The actor keeps
    /// running until the caller shuts it down, so this is the one to use
    /// while holding a lock on the registry.
    pub fn remove(&mut self, code: RoomCode) -> Result<RoomHandle, RoomError> {
        let handle = self.rooms.remove(&code).ok_or(RoomError::NotFound(code))?;
        tracing::info!(room = %code, rooms = self.rooms.len(), "room removed");
        Ok(handle)
    }

    /// Removes a room from the registry and shuts its actor down.
    pub async fn destroy_room(&mut self, code: RoomCode) -> Result<(), RoomError> {
        let handle = self.remove(code)?;
        let _ = handle.shutdown().await;
        Ok(())
    }

    /// Queries every room for its info. Rooms that fail to respond are
    /// skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.info().await {
                infos.push(info);
            }
        }
        infos
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().copied().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
