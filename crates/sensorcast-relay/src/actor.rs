//! Relay actor: the single task that owns the [`Relay`].
//!
//! Connection handlers never touch relay state directly. They send
//! commands down one mpsc channel and the actor applies them one at a
//! time, in arrival order, with no await in the middle of a handler. Two
//! connections racing for the presenter role are therefore decided by
//! whichever command reached the channel first.

use sensorcast_protocol::ClientEvent;
use sensorcast_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{PeerSender, Relay, RelayError, RelayInfo};

/// Commands sent to the relay actor.
pub(crate) enum RelayCommand {
    /// A connection was accepted.
    Connect { id: ConnectionId, sender: PeerSender },

    /// A decoded event from a connection.
    Event { from: ConnectionId, event: ClientEvent },

    /// A connection closed or failed.
    Disconnect { id: ConnectionId },

    /// Request a snapshot of relay state.
    Snapshot { reply: oneshot::Sender<RelayInfo> },

    /// Stop the actor.
    Shutdown,
}

/// Handle to the running relay actor.
///
/// Cheap to clone; every connection task holds one. Commands sent through
/// one handle are applied in the order they were sent.
#[derive(Clone)]
pub struct RelayHandle {
    sender: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Registers a connection and the queue its events are delivered to.
    pub async fn connect(&self, id: ConnectionId, sender: PeerSender) -> Result<(), RelayError> {
        self.send(RelayCommand::Connect { id, sender }).await
    }

    /// Forwards a client event (fire-and-forget).
    pub async fn submit(&self, from: ConnectionId, event: ClientEvent) -> Result<(), RelayError> {
        self.send(RelayCommand::Event { from, event }).await
    }

    /// Deregisters a connection, releasing the presenter role if it held it.
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect { id }).await
    }

    /// Returns a snapshot taken after every previously sent command.
    pub async fn info(&self) -> Result<RelayInfo, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RelayCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| RelayError::Unavailable)
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        self.send(RelayCommand::Shutdown).await
    }

    async fn send(&self, cmd: RelayCommand) -> Result<(), RelayError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RelayError::Unavailable)
    }
}

struct RelayActor {
    relay: Relay,
    receiver: mpsc::Receiver<RelayCommand>,
}

impl RelayActor {
    async fn run(mut self) {
        tracing::info!("relay actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RelayCommand::Connect { id, sender } => self.relay.connect(id, sender),
                RelayCommand::Event { from, event } => {
                    let queued = self.relay.handle(from, event);
                    tracing::trace!(conn_id = %from, queued, "event handled");
                }
                RelayCommand::Disconnect { id } => {
                    self.relay.disconnect(id);
                }
                RelayCommand::Snapshot { reply } => {
                    let _ = reply.send(self.relay.info());
                }
                RelayCommand::Shutdown => {
                    tracing::info!("relay shutting down");
                    break;
                }
            }
        }

        tracing::info!("relay actor stopped");
    }
}

/// Spawns the relay actor and returns a handle to it.
///
/// `channel_size` bounds the command channel. A full channel makes the
/// sending connection task wait, which only ever slows that connection.
///
/// # Panics
/// Panics if called outside a Tokio runtime or if `channel_size` is 0.
pub fn spawn_relay(channel_size: usize) -> RelayHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let actor = RelayActor {
        relay: Relay::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    RelayHandle { sender: tx }
}
