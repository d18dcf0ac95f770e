//! Per-connection handler: hello, room attachment, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Hello`, validate the version, attach to a room
//!   2. Subscribe to the room's events and views, then send `Welcome`
//!   3. Loop: client frames in, room traffic out, until close or idle

use std::sync::Arc;
use std::time::Instant;

use imposter_game::{Command, Reply};
use imposter_protocol::{
    ClientRole, Codec, ConnectionId, Envelope, ParticipantId, Payload, SeatToken,
    SystemMessage, PROTOCOL_VERSION,
};
use imposter_room::{RoomHandle, RoomOutbound};
use imposter_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::wire::{ClientCommand, Seat, ServerMessage};
use crate::ImposterError;

/// Drop guard that detaches a connection from its room when the handler
/// exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct ConnectionGuard {
    room: RoomHandle,
    connection: ConnectionId,
    seat: Seat,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let room = self.room.clone();
        let connection = self.connection;
        let seat = self.seat;
        tokio::spawn(async move {
            let _ = room.unsubscribe(connection).await;
            if !matches!(seat, Seat::Player(_)) {
                return;
            }
            if let Err(e) = room.apply(Command::Disconnect { connection }).await {
                tracing::debug!(%connection, error = %e, "disconnect not applied");
            }
        });
    }
}

/// Where a connection ended up after its `Hello`.
struct Attachment {
    room: RoomHandle,
    seat: Seat,
    participant_id: Option<ParticipantId>,
    token: Option<SeatToken>,
    reconnected: bool,
}

enum Flow {
    Continue,
    Close,
}

/// Writes envelopes to one connection, numbering them as it goes.
struct Outbox<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, C: Codec> Outbox<'a, C> {
    fn new(conn: &'a WebSocketConnection, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 0,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn next_seq(&mut self) -> u64 {
        let current = self.seq;
        self.seq += 1;
        current
    }

    async fn send(&mut self, envelope: Envelope) -> Result<(), ImposterError> {
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn system(&mut self, msg: SystemMessage) -> Result<(), ImposterError> {
        let envelope = Envelope::system(self.next_seq(), self.elapsed_ms(), msg);
        self.send(envelope).await
    }

    async fn game(&mut self, msg: &ServerMessage) -> Result<(), ImposterError> {
        let data = self.codec.encode(msg)?;
        let envelope = Envelope::game(self.next_seq(), self.elapsed_ms(), data);
        self.send(envelope).await
    }

    async fn error(&mut self, err: &ImposterError) -> Result<(), ImposterError> {
        self.system(SystemMessage::Error {
            code: err.status(),
            reason: err.reason().to_string(),
            message: err.to_string(),
        })
        .await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ImposterError> {
    let connection = conn.id();
    tracing::debug!(%connection, peer = %conn.peer_addr(), "handling new connection");

    let mut outbox = Outbox::new(&conn, &state.codec);

    // --- Step 1: Hello ---
    let Attachment {
        room,
        seat,
        participant_id,
        token,
        reconnected,
    } = perform_hello(&conn, &state, &mut outbox).await?;
    let code = room.code();
    let _guard = ConnectionGuard {
        room: room.clone(),
        connection,
        seat,
    };

    // --- Step 2: Subscribe, then welcome ---
    // The snapshot waits in `rx` until the loop starts.
    let (tx, mut rx) = mpsc::unbounded_channel();
    room.subscribe(connection, seat.viewer(), tx).await?;

    outbox
        .system(SystemMessage::Welcome {
            room: code,
            participant_id,
            token,
            reconnected,
            server_time: outbox.elapsed_ms(),
        })
        .await?;
    tracing::info!(room = %code, %connection, ?seat, reconnected, "connection attached");

    // --- Step 3: Message loop ---
    let idle_timeout = state.config.idle_timeout;
    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            received = conn.recv() => {
                let data = match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(room = %code, %connection, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(room = %code, %connection, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(tokio::time::Instant::now() + idle_timeout);

                let flow = handle_frame(&data, &state, &room, seat, &mut outbox).await?;
                if let Flow::Close = flow {
                    break;
                }
            }

            outbound = rx.recv() => {
                match outbound {
                    Some(RoomOutbound::Event(event)) => {
                        outbox.game(&ServerMessage::Event(event)).await?;
                    }
                    Some(RoomOutbound::View(view)) => {
                        outbox.game(&ServerMessage::View(view)).await?;
                    }
                    None => {
                        tracing::info!(room = %code, %connection, "room closed");
                        outbox
                            .system(SystemMessage::Goodbye { reason: "room closed".into() })
                            .await?;
                        break;
                    }
                }
            }

            () = &mut idle => {
                tracing::info!(room = %code, %connection, "connection idle, dropping");
                let _ = outbox
                    .system(SystemMessage::Goodbye { reason: "idle timeout".into() })
                    .await;
                break;
            }
        }
    }

    let _ = conn.close().await;
    // _guard drops here → unsubscribe and, for players, disconnect.
    Ok(())
}

/// Waits for `Hello` and attaches the connection. On rejection the client
/// gets an `Error` frame before the handler gives up.
async fn perform_hello<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    outbox: &mut Outbox<'_, C>,
) -> Result<Attachment, ImposterError> {
    let data = match tokio::time::timeout(state.config.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ImposterError::Handshake(
                "connection closed before hello".into(),
            ));
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            let err = ImposterError::Handshake("hello timed out".into());
            let _ = outbox.error(&err).await;
            return Err(err);
        }
    };

    match attach(conn.id(), &data, state).await {
        Ok(attachment) => Ok(attachment),
        Err(err) => {
            outbox.error(&err).await?;
            Err(err)
        }
    }
}

async fn attach<C: Codec>(
    connection: ConnectionId,
    data: &[u8],
    state: &ServerState<C>,
) -> Result<Attachment, ImposterError> {
    let envelope: Envelope = state.codec.decode(data)?;

    let (version, client) = match envelope.payload {
        Payload::System(SystemMessage::Hello { version, client }) => (version, client),
        _ => {
            return Err(ImposterError::Handshake(
                "first message must be Hello".into(),
            ));
        }
    };

    if version != PROTOCOL_VERSION {
        return Err(ImposterError::Handshake(format!(
            "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
        )));
    }

    match client {
        ClientRole::Moderator { room: None } => {
            let room = state.rooms.lock().await.create_room()?;
            Ok(Attachment {
                room,
                seat: Seat::Moderator,
                participant_id: None,
                token: None,
                reconnected: false,
            })
        }
        ClientRole::Moderator { room: Some(code) } => {
            let room = state.rooms.lock().await.get(code)?;
            Ok(Attachment {
                room,
                seat: Seat::Moderator,
                participant_id: None,
                token: None,
                reconnected: true,
            })
        }
        ClientRole::Display { room: code } => {
            let room = state.rooms.lock().await.get(code)?;
            Ok(Attachment {
                room,
                seat: Seat::Display,
                participant_id: None,
                token: None,
                reconnected: false,
            })
        }
        ClientRole::Player {
            room: code,
            name,
            token,
        } => {
            let room = state.rooms.lock().await.get(code)?;
            let reply = room
                .apply(Command::Join {
                    name,
                    token,
                    connection,
                })
                .await?;
            let Reply::Joined { receipt } = reply else {
                return Err(ImposterError::InvalidCommand(
                    "join did not produce a seat".into(),
                ));
            };
            Ok(Attachment {
                room,
                seat: Seat::Player(receipt.participant.id),
                participant_id: Some(receipt.participant.id),
                token: Some(receipt.token),
                reconnected: receipt.reconnected,
            })
        }
    }
}

/// Handles one frame from an attached client.
async fn handle_frame<C: Codec>(
    data: &[u8],
    state: &ServerState<C>,
    room: &RoomHandle,
    seat: Seat,
    outbox: &mut Outbox<'_, C>,
) -> Result<Flow, ImposterError> {
    let envelope: Envelope = match state.codec.decode(data) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(room = %room.code(), error = %e, "failed to decode envelope");
            outbox.error(&ImposterError::from(e)).await?;
            return Ok(Flow::Continue);
        }
    };

    match envelope.payload {
        Payload::System(msg) => handle_system_message(msg, outbox).await,
        Payload::Game(bytes) => handle_game_message(&bytes, state, room, seat, outbox).await,
    }
}

async fn handle_system_message<C: Codec>(
    msg: SystemMessage,
    outbox: &mut Outbox<'_, C>,
) -> Result<Flow, ImposterError> {
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let server_time = outbox.elapsed_ms();
            outbox
                .system(SystemMessage::HeartbeatAck {
                    client_time,
                    server_time,
                })
                .await?;
        }
        SystemMessage::Goodbye { reason } => {
            tracing::info!(%reason, "client said goodbye");
            return Ok(Flow::Close);
        }
        SystemMessage::Hello { .. } => {
            let err = ImposterError::Handshake("already attached to a room".into());
            outbox.error(&err).await?;
        }
        _ => {
            tracing::debug!("ignoring unexpected system message");
        }
    }
    Ok(Flow::Continue)
}

/// Decodes a [`ClientCommand`], checks it against the seat, and runs it.
/// Rejections go back to the sender as `Error` frames.
async fn handle_game_message<C: Codec>(
    bytes: &[u8],
    state: &ServerState<C>,
    room: &RoomHandle,
    seat: Seat,
    outbox: &mut Outbox<'_, C>,
) -> Result<Flow, ImposterError> {
    let command: ClientCommand = match state.codec.decode(bytes) {
        Ok(command) => command,
        Err(e) => {
            outbox.error(&ImposterError::from(e)).await?;
            return Ok(Flow::Continue);
        }
    };

    let outcome: Result<Option<ServerMessage>, ImposterError> = match command {
        ClientCommand::RequestView => room
            .view(seat.viewer())
            .await
            .map(|view| view.map(ServerMessage::View))
            .map_err(ImposterError::from),

        ClientCommand::CloseRoom if seat == Seat::Moderator => {
            let code = room.code();
            // Unregister under the lock, wait for the actor without it.
            let handle = state.rooms.lock().await.remove(code)?;
            let _ = handle.shutdown().await;
            tracing::info!(room = %code, "room closed by moderator");
            outbox
                .system(SystemMessage::Goodbye {
                    reason: "room closed".into(),
                })
                .await?;
            return Ok(Flow::Close);
        }

        ClientCommand::CloseRoom => Err(ImposterError::Forbidden(
            "only the moderator can close the room".into(),
        )),

        other => match other.into_command(seat) {
            Ok(command) => room
                .apply(command)
                .await
                .map(|reply| Some(ServerMessage::Reply(reply)))
                .map_err(ImposterError::from),
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok(Some(msg)) => outbox.game(&msg).await?,
        Ok(None) => {}
        Err(e) => {
            tracing::debug!(room = %room.code(), ?seat, reason = e.reason(), "command rejected");
            outbox.error(&e).await?;
        }
    }
    Ok(Flow::Continue)
}
