//! Relay state: the presenter slot plus a queue handle per connection.
//!
//! The relay never owns a connection. Each connection's handler gives it
//! the sending half of a bounded queue at connect time and takes it back
//! at disconnect. Delivery only ever uses `try_send`, so a viewer that
//! stops reading loses frames instead of stalling everyone else.

use std::collections::BTreeMap;

use sensorcast_protocol::{ClientEvent, Recipient, ServerEvent};
use sensorcast_transport::ConnectionId;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::PresenterSlot;
use crate::dispatch::{self, Outbound};

/// Sending half of a connection's outbound queue.
pub type PeerSender = mpsc::Sender<ServerEvent>;

/// Receiving half of a connection's outbound queue, drained by that
/// connection's writer.
pub type PeerReceiver = mpsc::Receiver<ServerEvent>;

/// Creates an outbound queue holding at most `capacity` undelivered events.
///
/// # Panics
/// Panics if `capacity` is 0.
pub fn peer_channel(capacity: usize) -> (PeerSender, PeerReceiver) {
    mpsc::channel(capacity)
}

/// A snapshot of relay state for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayInfo {
    /// Connection holding the presenter role, if any.
    pub presenter: Option<ConnectionId>,
    /// Number of registered connections, presenter included.
    pub peer_count: usize,
}

/// The session relay.
#[derive(Debug, Default)]
pub struct Relay {
    slot: PresenterSlot,
    /// Ordered by id so broadcast order is deterministic.
    peers: BTreeMap<ConnectionId, PeerSender>,
}

impl Relay {
    /// Creates a relay with no connections and no presenter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. It has no role until it asks for one.
    pub fn connect(&mut self, id: ConnectionId, sender: PeerSender) {
        if self.peers.insert(id, sender).is_some() {
            tracing::warn!(conn_id = %id, "connection registered twice, replacing queue");
        }
        tracing::info!(conn_id = %id, peers = self.peers.len(), "connection registered");
    }

    /// Deregisters a connection and releases the presenter slot if it held
    /// it. Viewers are not told the presenter left.
    ///
    /// Returns `true` if the slot was released.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        self.peers.remove(&id);
        let released = self.slot.release(id);
        if released {
            tracing::info!(conn_id = %id, "presenter disconnected, role is free");
        }
        tracing::info!(conn_id = %id, peers = self.peers.len(), "connection deregistered");
        released
    }

    /// Runs `event` through the dispatch table and queues the results.
    ///
    /// Returns how many events were queued across all recipients.
    /// Events from a connection that isn't registered are ignored.
    pub fn handle(&mut self, from: ConnectionId, event: ClientEvent) -> usize {
        if !self.peers.contains_key(&from) {
            tracing::debug!(conn_id = %from, event = event.name(), "event from unregistered connection");
            return 0;
        }
        let outbound = dispatch::dispatch(&mut self.slot, from, event);
        self.deliver(outbound)
    }

    /// The connection holding the presenter role, if any.
    pub fn presenter(&self) -> Option<ConnectionId> {
        self.slot.holder()
    }

    /// Number of registered connections.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Returns `true` if `id` is registered.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Current presenter and peer count, as reported by
    /// [`RelayHandle::info`](crate::RelayHandle::info).
    pub fn info(&self) -> RelayInfo {
        RelayInfo {
            presenter: self.presenter(),
            peer_count: self.peer_count(),
        }
    }

    fn deliver(&self, outbound: Outbound) -> usize {
        let mut queued = 0;
        for (recipient, event) in outbound {
            match recipient {
                Recipient::Connection(id) => {
                    if let Some(sender) = self.peers.get(&id) {
                        queued += usize::from(send_to(id, sender, event));
                    }
                }
                Recipient::AllExcept(_) => {
                    for (id, sender) in &self.peers {
                        if recipient.includes(*id) {
                            queued += usize::from(send_to(*id, sender, event.clone()));
                        }
                    }
                }
            }
        }
        queued
    }
}

/// Queues one event for one connection without waiting.
fn send_to(id: ConnectionId, sender: &PeerSender, event: ServerEvent) -> bool {
    match sender.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::debug!(conn_id = %id, event = event.name(), "outbound queue full, dropping");
            false
        }
        // Writer already gone; the disconnect is on its way.
        Err(TrySendError::Closed(_)) => false,
    }
}
