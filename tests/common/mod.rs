#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for the session engine integration tests.
//!
//! Provides a [`RecordingSink`] that captures every event the engine emits,
//! a channel-backed [`MockTransport`] for driving the gateway, and helpers
//! for building engines and rooms.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use sketch_session::config::EngineConfig;
use sketch_session::protocol::{ClientMessage, ServerMessage};
use sketch_session::registry::SessionRegistry;
use sketch_session::session::SettingsPatch;
use sketch_session::{
    ConnectionId, EventSink, FixedWordSupply, GameEngine, Transport, TransportError,
};
use tokio::sync::mpsc;
use uuid::Uuid;

// ── RecordingSink ───────────────────────────────────────────────────

#[derive(Default)]
struct SinkState {
    rooms: HashMap<String, HashSet<ConnectionId>>,
    inboxes: HashMap<ConnectionId, Vec<ServerMessage>>,
    broadcasts: HashMap<String, Vec<ServerMessage>>,
}

/// An [`EventSink`] that records what each connection would have received.
#[derive(Default)]
pub struct RecordingSink {
    state: StdMutex<SinkState>,
}

impl RecordingSink {
    /// Everything delivered to `connection` so far, in order.
    pub fn inbox(&self, connection: ConnectionId) -> Vec<ServerMessage> {
        self.state
            .lock()
            .unwrap()
            .inboxes
            .get(&connection)
            .cloned()
            .unwrap_or_default()
    }

    /// Drain and return `connection`'s inbox.
    pub fn take(&self, connection: ConnectionId) -> Vec<ServerMessage> {
        self.state
            .lock()
            .unwrap()
            .inboxes
            .remove(&connection)
            .unwrap_or_default()
    }

    /// Every broadcast sent to `room_code`, in order.
    pub fn broadcasts(&self, room_code: &str) -> Vec<ServerMessage> {
        self.state
            .lock()
            .unwrap()
            .broadcasts
            .get(room_code)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, connection: ConnectionId, room_code: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .rooms
            .get(room_code)
            .is_some_and(|members| members.contains(&connection))
    }
}

impl EventSink for RecordingSink {
    fn send_to(&self, connection: ConnectionId, message: ServerMessage) {
        self.state
            .lock()
            .unwrap()
            .inboxes
            .entry(connection)
            .or_default()
            .push(message);
    }

    fn broadcast(&self, room_code: &str, message: ServerMessage) {
        let mut state = self.state.lock().unwrap();
        let members: Vec<ConnectionId> = state
            .rooms
            .get(room_code)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        for member in members {
            state.inboxes.entry(member).or_default().push(message.clone());
        }
        state
            .broadcasts
            .entry(room_code.to_string())
            .or_default()
            .push(message);
    }

    fn join_room(&self, connection: ConnectionId, room_code: &str) {
        self.state
            .lock()
            .unwrap()
            .rooms
            .entry(room_code.to_string())
            .or_default()
            .insert(connection);
    }

    fn leave_room(&self, connection: ConnectionId, room_code: &str) {
        if let Some(members) = self.state.lock().unwrap().rooms.get_mut(room_code) {
            members.remove(&connection);
        }
    }
}

// ── Engine helpers ──────────────────────────────────────────────────

/// Words offered every round by [`engine`].
pub const WORDS: [&str; 3] = ["pizza", "moon", "tree"];

/// Build an engine offering [`WORDS`] and recording its events.
pub fn engine(config: EngineConfig) -> (GameEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let engine = GameEngine::new(
        config,
        Arc::new(SessionRegistry::new()),
        Arc::new(FixedWordSupply::new(WORDS)),
        Arc::clone(&sink) as Arc<dyn EventSink>,
    );
    (engine, sink)
}

/// A fresh connection handle.
pub fn conn() -> ConnectionId {
    Uuid::new_v4()
}

/// Parse a settings patch from JSON.
pub fn patch(value: serde_json::Value) -> SettingsPatch {
    serde_json::from_value(value).unwrap()
}

/// One player in a test room.
#[derive(Debug, Clone)]
pub struct Seat {
    pub id: String,
    pub conn: ConnectionId,
}

/// Create a room hosted by the first id and join the rest. Every non-host is
/// marked ready.
pub async fn lobby(engine: &GameEngine, ids: &[&str]) -> (String, Vec<Seat>) {
    let seats: Vec<Seat> = ids
        .iter()
        .map(|id| Seat {
            id: id.to_string(),
            conn: conn(),
        })
        .collect();
    let host = &seats[0];
    let code = engine
        .create_room(&host.id.to_uppercase(), &host.id, host.conn)
        .await
        .unwrap();
    for seat in &seats[1..] {
        engine
            .join_room(&code, &seat.id.to_uppercase(), &seat.id, seat.conn)
            .await
            .unwrap();
        engine.set_ready(&code, &seat.id, true).await.unwrap();
    }
    (code, seats)
}

/// Sleep just past `duration` so that timers due at exactly `duration` fire first.
pub async fn wait(duration: Duration) {
    tokio::time::sleep(duration + Duration::from_millis(1)).await;
}

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── MockTransport ───────────────────────────────────────────────────

/// A channel-backed transport. The test holds the matching [`MockPeer`].
pub struct MockTransport {
    incoming: mpsc::UnboundedReceiver<String>,
    outgoing: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

/// The client's end of a [`MockTransport`].
pub struct MockPeer {
    to_server: Option<mpsc::UnboundedSender<String>>,
    from_server: mpsc::UnboundedReceiver<String>,
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn pair() -> (Self, MockPeer) {
        let (to_server, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_server) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming,
            outgoing,
            closed: Arc::clone(&closed),
        };
        let peer = MockPeer {
            to_server: Some(to_server),
            from_server,
            closed,
        };
        (transport, peer)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), TransportError> {
        self.outgoing
            .send(message)
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.incoming.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

impl MockPeer {
    /// Send a command to the server.
    pub fn send(&self, message: &ClientMessage) {
        self.send_raw(&serde_json::to_string(message).unwrap());
    }

    /// Send a raw text frame.
    pub fn send_raw(&self, text: &str) {
        if let Some(tx) = &self.to_server {
            tx.send(text.to_string()).unwrap();
        }
    }

    /// Close the client side of the connection.
    pub fn hang_up(&mut self) {
        self.to_server = None;
    }

    /// Next event from the server, failing after one second.
    pub async fn next(&mut self) -> ServerMessage {
        let text = tokio::time::timeout(Duration::from_secs(1), self.from_server.recv())
            .await
            .expect("timed out waiting for server event")
            .expect("server closed the connection");
        serde_json::from_str(&text).unwrap()
    }

    /// Skip events until one with wire name `name` arrives.
    pub async fn next_named(&mut self, name: &str) -> ServerMessage {
        loop {
            let event = self.next().await;
            if event.name() == name {
                return event;
            }
        }
    }
}
