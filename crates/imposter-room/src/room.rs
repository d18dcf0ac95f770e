//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Connections subscribe to a room under a [`Viewer`]. After every command
//! the actor drains the session's events, delivers each one to the
//! subscribers its audience allows, and, if the command succeeded, pushes
//! everyone a fresh view.

use std::collections::HashMap;

use imposter_game::{Command, GameError, GameEvent, Phase, Reply, Session, View, Viewer};
use imposter_protocol::{Audience, ConnectionId, RoomCode};
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// An outbound message from the room actor to a connection handler.
#[derive(Debug, Clone)]
pub enum RoomOutbound {
    Event(GameEvent),
    /// A snapshot, sent on subscribe and after every successful command.
    View(View),
}

/// Channel sender for delivering outbound messages to a connection.
pub type SubscriberSender = mpsc::UnboundedSender<RoomOutbound>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Run a game command.
    Apply {
        command: Command,
        reply: oneshot::Sender<Result<Reply, GameError>>,
    },

    /// Start delivering events and views to a connection. Replaces any
    /// earlier subscription from the same connection.
    Subscribe {
        connection: ConnectionId,
        viewer: Viewer,
        sender: SubscriberSender,
        reply: oneshot::Sender<()>,
    },

    Unsubscribe {
        connection: ConnectionId,
    },

    View {
        viewer: Viewer,
        reply: oneshot::Sender<Option<View>>,
    },

    Info {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    pub round: u32,
    pub participants: usize,
    pub alive: usize,
    pub subscribers: usize,
}

/// Handle to a running room actor.
///
/// Cheap to clone; it wraps an `mpsc::Sender`. The registry holds one per
/// room and hands out clones.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> RoomCode {
        self.code
    }

    async fn request<T>(
        &self,
        command: RoomCommand,
        reply: oneshot::Receiver<T>,
    ) -> Result<T, RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable(self.code))?;
        reply.await.map_err(|_| RoomError::Unavailable(self.code))
    }

    /// Runs a game command and waits for its reply.
    pub async fn apply(&self, command: Command) -> Result<Reply, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let result = self
            .request(
                RoomCommand::Apply {
                    command,
                    reply: reply_tx,
                },
                reply_rx,
            )
            .await?;
        Ok(result?)
    }

    /// Subscribes a connection. The current view for `viewer` is queued on
    /// `sender` before this returns.
    pub async fn subscribe(
        &self,
        connection: ConnectionId,
        viewer: Viewer,
        sender: SubscriberSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(
            RoomCommand::Subscribe {
                connection,
                viewer,
                sender,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await
    }

    /// Stops delivery to a connection (fire-and-forget).
    pub async fn unsubscribe(&self, connection: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Unsubscribe { connection })
            .await
            .map_err(|_| RoomError::Unavailable(self.code))
    }

    /// The current projection for `viewer`; `None` for an unknown
    /// participant.
    pub async fn view(&self, viewer: Viewer) -> Result<Option<View>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(
            RoomCommand::View {
                viewer,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(RoomCommand::Info { reply: reply_tx }, reply_rx)
            .await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code))
    }
}

struct Subscriber {
    viewer: Viewer,
    sender: SubscriberSender,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    session: Session,
    subscribers: HashMap<ConnectionId, Subscriber>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown or until
    /// every handle is dropped.
    async fn run(mut self) {
        let room = self.session.code();
        tracing::info!(%room, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Apply { command, reply } => {
                    let result = self.handle_apply(command);
                    let _ = reply.send(result);
                }
                RoomCommand::Subscribe {
                    connection,
                    viewer,
                    sender,
                    reply,
                } => {
                    self.handle_subscribe(connection, viewer, sender);
                    let _ = reply.send(());
                }
                RoomCommand::Unsubscribe { connection } => {
                    if self.subscribers.remove(&connection).is_some() {
                        tracing::debug!(%room, %connection, "unsubscribed");
                    }
                }
                RoomCommand::View { viewer, reply } => {
                    let _ = reply.send(self.session.view_for(viewer));
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room, "room actor stopped");
    }

    fn handle_apply(&mut self, command: Command) -> Result<Reply, GameError> {
        let result = self.session.apply(command);
        let events = self.session.take_events();
        self.dispatch(events);
        if result.is_ok() {
            self.broadcast_views();
        }
        result
    }

    fn handle_subscribe(
        &mut self,
        connection: ConnectionId,
        viewer: Viewer,
        sender: SubscriberSender,
    ) {
        if let Some(view) = self.session.view_for(viewer) {
            let _ = sender.send(RoomOutbound::View(view));
        }
        self.subscribers
            .insert(connection, Subscriber { viewer, sender });
        tracing::debug!(
            room = %self.session.code(),
            %connection,
            ?viewer,
            subscribers = self.subscribers.len(),
            "subscribed"
        );
    }

    /// Delivers each event to the subscribers its audience allows.
    fn dispatch(&mut self, events: Vec<(Audience, GameEvent)>) {
        for (audience, event) in events {
            for subscriber in self.subscribers.values() {
                if subscriber.viewer.receives(audience) {
                    let _ = subscriber.sender.send(RoomOutbound::Event(event.clone()));
                }
            }
        }
        self.prune();
    }

    fn broadcast_views(&mut self) {
        for subscriber in self.subscribers.values() {
            if let Some(view) = self.session.view_for(subscriber.viewer) {
                let _ = subscriber.sender.send(RoomOutbound::View(view));
            }
        }
        self.prune();
    }

    /// Drops subscribers whose connection handler is gone.
    fn prune(&mut self) {
        self.subscribers.retain(|_, s| !s.sender.is_closed());
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.session.code(),
            phase: self.session.phase(),
            round: self.session.round(),
            participants: self.session.roster().len(),
            alive: self.session.roster().alive_count(),
            subscribers: self.subscribers.len(),
        }
    }
}

/// Spawns a room actor around `session` and returns a handle to it.
///
/// `channel_size` controls backpressure: if the channel fills up, senders
/// wait (bounded channel).
pub(crate) fn spawn_room(session: Session, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = session.code();

    let actor = RoomActor {
        session,
        subscribers: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
