//! Room actors and the room registry for Find The Imposter.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! game [`Session`](imposter_game::Session). Commands reach it through a
//! bounded channel and are applied one at a time, so a session never needs
//! a lock.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms under fresh codes, looks them up,
//!   destroys them
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`RoomOutbound`]: what a subscribed connection receives
//! - [`RoomConfig`]: channel size, initial settings, code retry budget

mod config;
mod error;
mod manager;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomRegistry;
pub use room::{RoomHandle, RoomInfo, RoomOutbound, SubscriberSender};
