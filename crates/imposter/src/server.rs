//! `ImposterServer` builder and accept loop.
//!
//! This is the entry point for running a game server. It owns the
//! WebSocket listener and the room registry; every accepted connection gets
//! its own handler task.

use std::sync::Arc;
use std::time::Duration;

use imposter_protocol::{Codec, JsonCodec};
use imposter_room::{RoomConfig, RoomRegistry};
use imposter_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ImposterError;

/// Server-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// A connection that sends nothing for this long is dropped. Clients
    /// are expected to heartbeat well inside it.
    pub idle_timeout: Duration,

    /// How long a new connection has to send its `Hello`.
    pub handshake_timeout: Duration,

    /// Applied to every room this server creates.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(5),
            room: RoomConfig::default(),
        }
    }
}

/// State shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a server.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use imposter::ImposterServer;
///
/// # async fn run() -> Result<(), imposter::ImposterError> {
/// let server = ImposterServer::builder()
///     .bind("0.0.0.0:8080")
///     .idle_timeout(Duration::from_secs(60))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ImposterServerBuilder {
    config: ServerConfig,
}

impl ImposterServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from a complete configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Binds the listener. Uses [`JsonCodec`].
    ///
    /// # Errors
    /// [`ImposterError::Transport`] if the address can't be bound.
    pub async fn build(self) -> Result<ImposterServer<JsonCodec>, ImposterError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Binds the listener with a custom codec.
    pub async fn build_with_codec<C: Codec>(
        self,
        codec: C,
    ) -> Result<ImposterServer<C>, ImposterError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomRegistry::new(self.config.room.clone())),
            codec,
            config: self.config,
        });

        Ok(ImposterServer { transport, state })
    }
}

impl Default for ImposterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ImposterServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ImposterServer<JsonCodec> {
    pub fn builder() -> ImposterServerBuilder {
        ImposterServerBuilder::new()
    }
}

impl<C: Codec> ImposterServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// A failed accept (including a failed WebSocket upgrade) is logged
    /// and the loop carries on.
    pub async fn run(mut self) -> Result<(), ImposterError> {
        tracing::info!("imposter server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(imposter_transport::TransportError::Shutdown) => {
                    tracing::info!("transport shut down, stopping");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
