//! Real-time gateway: the boundary between connections and the engine.
//!
//! The gateway trims and validates every inbound command, uppercases room
//! codes, and converts any [`GameError`] into a `room:error` addressed to the
//! issuing connection only. Once a command is accepted it relays nothing
//! itself; the engine decides what the room hears.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, GatewayConfig};
use crate::engine::{GameEngine, NewStroke};
use crate::error::{GameError, Result};
use crate::hub::Hub;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::SessionRegistry;
use crate::room_code;
use crate::transport::{ConnectionId, EventSink, Transport};
use crate::words::{TieredWordSupply, WordSupply};

/// Cheaply cloneable entry point for connections.
#[derive(Debug, Clone)]
pub struct Gateway {
    engine: GameEngine,
    hub: Arc<Hub>,
    config: GatewayConfig,
}

impl Gateway {
    /// Wire up a hub, a fresh registry, the default word pool and an engine.
    pub fn new(engine_config: EngineConfig, config: GatewayConfig) -> Self {
        Self::with_words(engine_config, config, Arc::new(TieredWordSupply::default()))
    }

    /// Same as [`new`](Self::new) with a custom word source.
    pub fn with_words(
        engine_config: EngineConfig,
        config: GatewayConfig,
        words: Arc<dyn WordSupply>,
    ) -> Self {
        let hub = Arc::new(Hub::new(config.outbound_channel_capacity));
        let engine = GameEngine::new(
            engine_config,
            Arc::new(SessionRegistry::new()),
            words,
            Arc::clone(&hub) as Arc<dyn EventSink>,
        );
        Self::with_engine(engine, hub, config)
    }

    /// Use an engine that already emits into `hub`.
    pub fn with_engine(engine: GameEngine, hub: Arc<Hub>, config: GatewayConfig) -> Self {
        Self {
            engine,
            hub,
            config,
        }
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Parse one text frame and dispatch it. Unparseable frames are answered
    /// with a `MESSAGE_MALFORMED` error.
    pub async fn handle_text(&self, connection: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.dispatch(connection, message).await,
            Err(e) => {
                debug!(connection = %connection, error = %e, "malformed client frame");
                self.reject(connection, &GameError::from(e));
            }
        }
    }

    /// Run one command on behalf of `connection`.
    pub async fn dispatch(&self, connection: ConnectionId, message: ClientMessage) {
        let name = message.name();
        if let Err(err) = self.try_dispatch(connection, message).await {
            debug!(connection = %connection, command = name, error = %err, "command rejected");
            self.reject(connection, &err);
        }
    }

    fn reject(&self, connection: ConnectionId, err: &GameError) {
        self.hub.send_to(
            connection,
            ServerMessage::RoomError {
                message: err.to_string(),
                error_code: Some(err.code()),
            },
        );
    }

    async fn try_dispatch(&self, connection: ConnectionId, message: ClientMessage) -> Result<()> {
        let engine = &self.engine;
        match message {
            ClientMessage::CreateRoom { name, player_id } => {
                let name = required(&name, "name")?;
                let player_id = required(&player_id, "playerId")?;
                engine.create_room(&name, &player_id, connection).await?;
            }
            ClientMessage::JoinRoom {
                room_code,
                name,
                player_id,
            } => {
                let code = room(&room_code)?;
                let name = required(&name, "name")?;
                let player_id = required(&player_id, "playerId")?;
                engine.join_room(&code, &name, &player_id, connection).await?;
            }
            ClientMessage::ReconnectHello {
                room_code,
                player_id,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.reconnect_hello(&code, &player_id, connection).await?;
            }
            ClientMessage::LeaveRoom {
                room_code,
                player_id,
            } => {
                // Leaving is best effort and never reports back.
                let Ok((code, player_id)) = room_and_player(&room_code, &player_id) else {
                    return Ok(());
                };
                self.hub.leave_room(connection, &code);
                if let Err(err) = engine.leave_room(&code, &player_id).await {
                    debug!(room = %code, error = %err, "leave failed");
                }
            }
            ClientMessage::SetReady {
                room_code,
                player_id,
                is_ready,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.set_ready(&code, &player_id, is_ready).await?;
            }
            ClientMessage::UpdateSettings {
                room_code,
                player_id,
                settings,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.update_settings(&code, &player_id, &settings).await?;
            }
            ClientMessage::StartGame {
                room_code,
                player_id,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.start_game(&code, &player_id).await?;
            }
            ClientMessage::SelectWord {
                room_code,
                player_id,
                word,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                let word = required(&word, "word")?.to_lowercase();
                engine.select_word(&code, &player_id, &word).await?;
            }
            ClientMessage::DrawStroke {
                room_code,
                player_id,
                stroke_id,
                color,
                width,
                points,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                let stroke_id = required(&stroke_id, "strokeId")?;
                let stroke = NewStroke {
                    stroke_id,
                    color,
                    width,
                    points,
                };
                engine.add_stroke(&code, &player_id, stroke).await?;
            }
            ClientMessage::ClearCanvas {
                room_code,
                player_id,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.clear_canvas(&code, &player_id).await?;
            }
            ClientMessage::UndoStroke {
                room_code,
                player_id,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.undo_stroke(&code, &player_id).await?;
            }
            ClientMessage::ChatSend {
                room_code,
                player_id,
                text,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.handle_chat_send(&code, &player_id, &text).await?;
            }
            ClientMessage::SyncRequest {
                room_code,
                player_id,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.request_sync(&code, &player_id, connection).await?;
            }
            ClientMessage::Rematch {
                room_code,
                player_id,
                mode,
            } => {
                let (code, player_id) = room_and_player(&room_code, &player_id)?;
                engine.rematch(&code, &player_id, mode).await?;
            }
        }
        Ok(())
    }

    // ── Connection loop ─────────────────────────────────────────────

    /// Drive one connection until either side closes it.
    ///
    /// Inbound frames are dispatched in arrival order; outbound events are
    /// drained from the hub. On exit the connection is unregistered and its
    /// player, if any, is marked disconnected.
    pub async fn serve_connection(&self, mut transport: impl Transport) {
        let (connection, mut outbound) = self.hub.register();
        info!(connection = %connection, "connection opened");

        loop {
            tokio::select! {
                event = outbound.recv() => {
                    let Some(event) = event else {
                        debug!(connection = %connection, "outbound channel closed");
                        break;
                    };
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            if let Err(e) = transport.send(json).await {
                                warn!(connection = %connection, error = %e, "transport send error");
                                break;
                            }
                        }
                        Err(e) => {
                            error!(connection = %connection, event = event.name(), error = %e, "failed to serialize event");
                        }
                    }
                }

                incoming = transport.recv() => {
                    match incoming {
                        Some(Ok(text)) => self.handle_text(connection, &text).await,
                        Some(Err(e)) => {
                            warn!(connection = %connection, error = %e, "transport receive error");
                            break;
                        }
                        None => {
                            debug!(connection = %connection, "transport closed by peer");
                            break;
                        }
                    }
                }
            }
        }

        let _ = transport.close().await;
        self.hub.unregister(connection);
        if let Some(room) = self.engine.mark_disconnected(connection).await {
            debug!(connection = %connection, room = %room, "player marked disconnected");
        }
        info!(connection = %connection, "connection closed");
    }
}

// ── Validation ──────────────────────────────────────────────────────

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput(format!("missing {field}")));
    }
    Ok(trimmed.to_string())
}

fn room(value: &str) -> Result<String> {
    let code = room_code::normalize(value);
    if code.is_empty() {
        return Err(GameError::InvalidInput("missing roomCode".into()));
    }
    Ok(code)
}

fn room_and_player(room_code: &str, player_id: &str) -> Result<(String, String)> {
    Ok((room(room_code)?, required(player_id, "playerId")?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error_codes::ErrorCode;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("  bob ", "name").unwrap(), "bob");
        let err = required("   ", "name").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(err.to_string(), "Invalid payload: missing name");
    }

    #[test]
    fn room_codes_are_uppercased() {
        assert_eq!(room(" ab12cd ").unwrap(), "AB12CD");
        assert!(room("").is_err());
    }
}
