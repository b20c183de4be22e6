//! The session state machine.
//!
//! [`GameEngine`] owns every phase transition. Player commands and timer
//! callbacks both go through the room's mutex, so two mutations of the same
//! room never interleave; rooms do not contend with each other.
//!
//! Once a command has succeeded the engine alone decides who hears about it:
//! room-wide events go through [`EventSink::broadcast`], private ones (word
//! options, the secret word, sync snapshots) through [`EventSink::send_to`].

mod lobby;
mod round;
mod timer;

use std::fmt;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{GameError, Result};
use crate::protocol::{RoomStatePublic, ServerMessage, SyncStatePayload};
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::transport::{ConnectionId, EventSink};
use crate::words::WordSupply;

pub use round::NewStroke;
pub use timer::TimerKind;

/// Result of [`GameEngine::handle_chat_send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Dropped: the sender is still inside the chat cooldown.
    RateLimited,
    /// Dropped: nothing left after trimming.
    Empty,
    /// Relayed as plain chat.
    Message,
    /// Relayed and credited as a correct guess worth `points`.
    CorrectGuess { points: u32 },
}

struct EngineInner {
    registry: Arc<SessionRegistry>,
    words: Arc<dyn WordSupply>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

/// Cheaply cloneable handle to the engine.
#[derive(Clone)]
pub struct GameEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("rooms", &self.inner.registry.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Build an engine over an existing store, word source and event sink.
    pub fn new(
        config: EngineConfig,
        registry: Arc<SessionRegistry>,
        words: Arc<dyn WordSupply>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry,
                words,
                sink,
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.inner.registry
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.inner.registry.len()
    }

    // ── Locking ─────────────────────────────────────────────────────

    /// Resolve and lock a room. Rooms destroyed while we waited for the lock
    /// are reported as missing.
    async fn lock_room(&self, room_code: &str) -> Result<OwnedMutexGuard<Session>> {
        let handle = self
            .inner
            .registry
            .get(room_code)
            .ok_or(GameError::RoomNotFound)?;
        let session = handle.lock_owned().await;
        if session.closed {
            return Err(GameError::RoomNotFound);
        }
        Ok(session)
    }

    // ── Emission ────────────────────────────────────────────────────

    fn send_to(&self, connection: ConnectionId, message: ServerMessage) {
        self.inner.sink.send_to(connection, message);
    }

    fn broadcast(&self, session: &Session, message: ServerMessage) {
        self.inner.sink.broadcast(&session.room_code, message);
    }

    fn broadcast_state(&self, session: &Session) {
        self.broadcast(
            session,
            ServerMessage::RoomState(Box::new(session.to_public_state())),
        );
    }

    fn send_sync(&self, session: &Session, player_id: &str, connection: ConnectionId) {
        self.send_to(
            connection,
            ServerMessage::SyncState(Box::new(session.sync_state(player_id))),
        );
    }

    // ── Read-only queries ───────────────────────────────────────────

    /// Public snapshot of a room.
    pub async fn snapshot(&self, room_code: &str) -> Result<RoomStatePublic> {
        let session = self.lock_room(room_code).await?;
        Ok(session.to_public_state())
    }

    /// Catch-up snapshot for `player_id`, with word options only for the
    /// drawer during word selection.
    pub async fn get_sync_state(&self, room_code: &str, player_id: &str) -> Result<SyncStatePayload> {
        let session = self.lock_room(room_code).await?;
        Ok(session.sync_state(player_id))
    }

    /// Answer a `sync:request` by sending the snapshot to `connection`.
    pub async fn request_sync(
        &self,
        room_code: &str,
        player_id: &str,
        connection: ConnectionId,
    ) -> Result<()> {
        let session = self.lock_room(room_code).await?;
        self.send_sync(&session, player_id, connection);
        Ok(())
    }

    /// A transport dropped: flag the player bound to `connection` as
    /// disconnected (without removing them) and tell the room.
    ///
    /// Returns the code of the affected room, if any.
    pub async fn mark_disconnected(&self, connection: ConnectionId) -> Option<String> {
        for (code, handle) in self.inner.registry.handles() {
            let mut session = handle.lock().await;
            if session.closed {
                continue;
            }
            let Some(player) = session
                .players
                .iter_mut()
                .find(|p| p.connection == connection)
            else {
                continue;
            };
            player.is_connected = false;
            debug!(room = %code, player = %player.player_id, "player disconnected");
            self.broadcast_state(&session);
            return Some(code);
        }
        None
    }
}
