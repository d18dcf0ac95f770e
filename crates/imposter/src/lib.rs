//! # Find The Imposter
//!
//! A WebSocket server for a party word game. One moderator runs the game
//! from a control panel, a shared screen shows the public state, and
//! players join from their phones with a four-letter room code. Everyone
//! gets the same secret word except the imposters, who get a close
//! neighbor.
//!
//! The crate ties the layers together:
//!
//! ```text
//! transport (WebSocket) → protocol (Envelope) → room actor → game session
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imposter::ImposterServer;
//!
//! # async fn run() -> Result<(), imposter::ImposterError> {
//! let server = ImposterServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
pub mod wire;

pub use error::ImposterError;
pub use server::{ImposterServer, ImposterServerBuilder, ServerConfig};

/// Types a client or a test needs to talk to the server.
pub mod prelude {
    pub use crate::wire::{ClientCommand, Seat, ServerMessage};
    pub use crate::{ImposterError, ImposterServer, ImposterServerBuilder, ServerConfig};
    pub use imposter_game::{
        GameEvent, Phase, Reply, Settings, SettingsUpdate, Side, View, Viewer,
    };
    pub use imposter_protocol::{
        ClientRole, Envelope, ParticipantId, Payload, RoomCode, SeatToken, SystemMessage,
        PROTOCOL_VERSION,
    };
    pub use imposter_room::RoomConfig;
}
