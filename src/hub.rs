//! Connection hub: per-connection outbound channels and room subscriptions.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::transport::{ConnectionId, EventSink};

#[derive(Debug, Default)]
struct HubState {
    connections: HashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

/// In-process [`EventSink`] backed by bounded channels.
///
/// Each registered connection owns the receiving end of its channel; the
/// gateway drains it into the connection's [`Transport`](crate::Transport).
#[derive(Debug)]
pub struct Hub {
    capacity: usize,
    state: Mutex<HubState>,
}

impl Hub {
    /// Create a hub whose per-connection channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(HubState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new connection and return its id and outbound receiver.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.capacity);
        self.lock().connections.insert(id, tx);
        debug!(connection = %id, "connection registered");
        (id, rx)
    }

    /// Forget a connection and drop it from every room.
    pub fn unregister(&self, connection: ConnectionId) {
        let mut state = self.lock();
        state.connections.remove(&connection);
        state.rooms.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
        debug!(connection = %connection, "connection unregistered");
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Connections currently subscribed to `room_code`.
    pub fn room_members(&self, room_code: &str) -> Vec<ConnectionId> {
        self.lock()
            .rooms
            .get(room_code)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(crate::config::GatewayConfig::default().outbound_channel_capacity)
    }
}

/// Push an event without blocking. If the channel is full, log a warning and
/// drop the event.
fn deliver(connection: ConnectionId, tx: &mpsc::Sender<ServerMessage>, message: ServerMessage) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                connection = %connection,
                event = dropped.name(),
                "outbound channel full, dropping event"
            );
        }
        Err(mpsc::error::TrySendError::Closed(dropped)) => {
            debug!(
                connection = %connection,
                event = dropped.name(),
                "outbound channel closed, receiver dropped"
            );
        }
    }
}

impl EventSink for Hub {
    fn send_to(&self, connection: ConnectionId, message: ServerMessage) {
        let state = self.lock();
        match state.connections.get(&connection) {
            Some(tx) => deliver(connection, tx, message),
            None => debug!(connection = %connection, event = message.name(), "no such connection"),
        }
    }

    fn broadcast(&self, room_code: &str, message: ServerMessage) {
        let state = self.lock();
        let Some(members) = state.rooms.get(room_code) else {
            return;
        };
        for connection in members {
            if let Some(tx) = state.connections.get(connection) {
                deliver(*connection, tx, message.clone());
            }
        }
    }

    fn join_room(&self, connection: ConnectionId, room_code: &str) {
        let mut state = self.lock();
        if !state.connections.contains_key(&connection) {
            return;
        }
        state
            .rooms
            .entry(room_code.to_string())
            .or_default()
            .insert(connection);
    }

    fn leave_room(&self, connection: ConnectionId, room_code: &str) {
        let mut state = self.lock();
        if let Some(members) = state.rooms.get_mut(room_code) {
            members.remove(&connection);
            if members.is_empty() {
                state.rooms.remove(room_code);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn clear(code: &str) -> ServerMessage {
        ServerMessage::CanvasClear {
            room_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_room_members_only() {
        let hub = Hub::new(8);
        let (a, mut rx_a) = hub.register();
        let (b, mut rx_b) = hub.register();
        let (_c, mut rx_c) = hub.register();
        hub.join_room(a, "ROOM");
        hub.join_room(b, "ROOM");

        hub.broadcast("ROOM", clear("ROOM"));

        assert_eq!(rx_a.try_recv().unwrap(), clear("ROOM"));
        assert_eq!(rx_b.try_recv().unwrap(), clear("ROOM"));
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let hub = Hub::new(1);
        let (a, mut rx) = hub.register();
        hub.send_to(a, clear("ONE"));
        hub.send_to(a, clear("TWO"));
        assert_eq!(rx.try_recv().unwrap(), clear("ONE"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_from_rooms() {
        let hub = Hub::new(4);
        let (a, _rx_a) = hub.register();
        let (b, _rx_b) = hub.register();
        hub.join_room(a, "ROOM");
        hub.join_room(b, "ROOM");
        assert_eq!(hub.connection_count(), 2);

        hub.unregister(a);
        assert_eq!(hub.connection_count(), 1);
        assert_eq!(hub.room_members("ROOM"), vec![b]);

        hub.leave_room(b, "ROOM");
        assert!(hub.room_members("ROOM").is_empty());
    }

    #[test]
    fn unknown_connection_cannot_join() {
        let hub = Hub::new(4);
        hub.join_room(Uuid::new_v4(), "ROOM");
        assert!(hub.room_members("ROOM").is_empty());
    }
}
