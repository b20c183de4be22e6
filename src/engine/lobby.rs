//! Membership and lobby operations: create, join, reconnect, leave, ready,
//! settings, start and rematch.

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use super::GameEngine;
use crate::error::{GameError, Result};
use crate::protocol::{RematchMode, RoomJoinedPayload, RoundEndReason, ServerMessage};
use crate::room_code;
use crate::session::{self, Phase, Player, RoundState, Session, SettingsPatch};
use crate::transport::ConnectionId;

impl GameEngine {
    /// Open a new room with the caller as its only player and host.
    ///
    /// Returns the allocated room code.
    pub async fn create_room(
        &self,
        name: &str,
        player_id: &str,
        connection: ConnectionId,
    ) -> Result<String> {
        let host = Player::new(player_id.to_string(), name.to_string(), connection);
        let mut pending = Session::new(
            String::new(),
            host,
            self.inner.config.default_settings.clone(),
        );

        let handle = loop {
            let code = room_code::generate(self.inner.config.room_code_length);
            pending.room_code = code.clone();
            match self.inner.registry.try_insert(&code, pending) {
                Ok(handle) => break handle,
                Err(taken) => {
                    debug!(room = %code, "room code collision, retrying");
                    pending = taken;
                }
            }
        };

        let session = handle.lock().await;
        let code = session.room_code.clone();
        info!(room = %code, player = %player_id, "room created");

        self.inner.sink.join_room(connection, &code);
        self.send_to(
            connection,
            ServerMessage::RoomCreated(Box::new(RoomJoinedPayload {
                room_code: code.clone(),
                state: session.to_public_state(),
            })),
        );
        self.broadcast_state(&session);
        Ok(code)
    }

    /// Join a room, or rejoin it under a known `player_id`.
    ///
    /// A rejoin refreshes the name and connection and does not count against
    /// capacity. Joining mid-game is allowed; the drawer rotation only picks
    /// up newcomers once the lobby re-forms.
    pub async fn join_room(
        &self,
        room_code: &str,
        name: &str,
        player_id: &str,
        connection: ConnectionId,
    ) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;

        let previous = match session.player_mut(player_id) {
            Some(existing) => {
                let previous = existing.connection;
                existing.connection = connection;
                existing.is_connected = true;
                if !name.is_empty() {
                    existing.name = name.to_string();
                }
                Some(previous)
            }
            None => {
                if session.players.len() >= session.settings.max_players {
                    return Err(GameError::RoomFull);
                }
                session
                    .players
                    .push(Player::new(player_id.to_string(), name.to_string(), connection));
                None
            }
        };
        if session.phase == Phase::Lobby {
            session.reset_drawer_order();
        }

        let code = session.room_code.clone();
        match previous {
            Some(old) if old != connection => {
                self.inner.sink.leave_room(old, &code);
                info!(room = %code, player = %player_id, "player rejoined");
            }
            Some(_) => debug!(room = %code, player = %player_id, "player rejoined on same connection"),
            None => info!(room = %code, player = %player_id, players = session.players.len(), "player joined"),
        }

        self.inner.sink.join_room(connection, &code);
        self.send_to(
            connection,
            ServerMessage::RoomJoined(Box::new(RoomJoinedPayload {
                room_code: code.clone(),
                state: session.to_public_state(),
            })),
        );
        self.broadcast_state(&session);
        self.send_sync(&session, player_id, connection);

        if session.phase == Phase::SelectingWord && session.round.is_drawer(player_id) {
            self.send_to(
                connection,
                ServerMessage::WordOptions {
                    room_code: code,
                    options: session.round.word_options.clone(),
                    select_ends_at: session
                        .round
                        .word_select_ends_at
                        .unwrap_or_else(session::now_millis),
                },
            );
        }
        Ok(())
    }

    /// Rebind a known player to a fresh connection. Score, phase and round
    /// state are left untouched.
    pub async fn reconnect_hello(
        &self,
        room_code: &str,
        player_id: &str,
        connection: ConnectionId,
    ) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        let player = session.player_mut(player_id).ok_or(GameError::PlayerNotFound)?;
        let previous = player.connection;
        player.connection = connection;
        player.is_connected = true;

        let code = session.room_code.clone();
        if previous != connection {
            self.inner.sink.leave_room(previous, &code);
        }
        self.inner.sink.join_room(connection, &code);
        debug!(room = %code, player = %player_id, "player reconnected");

        self.broadcast_state(&session);
        self.send_sync(&session, player_id, connection);
        Ok(())
    }

    /// Remove a player. Unknown rooms and players are ignored.
    ///
    /// The last player out destroys the room. A departing host hands over to
    /// the longest-tenured player; a departing drawer ends or skips the turn;
    /// dropping below two players mid-game ends the game.
    pub async fn leave_room(&self, room_code: &str, player_id: &str) -> Result<()> {
        let mut session = match self.lock_room(room_code).await {
            Ok(session) => session,
            Err(GameError::RoomNotFound) => return Ok(()),
            Err(err) => return Err(err),
        };
        let was_drawer = session.round.is_drawer(player_id);
        let Some(removed) = session.remove_player(player_id) else {
            return Ok(());
        };
        if was_drawer {
            session.round.drawer_id = None;
        }
        let code = session.room_code.clone();
        self.inner.sink.leave_room(removed.connection, &code);

        if session.players.is_empty() {
            session.closed = true;
            session.round.timers.cancel_all();
            self.inner.registry.delete(&code);
            info!(room = %code, "last player left, room destroyed");
            return Ok(());
        }
        info!(room = %code, player = %player_id, host = %session.host_player_id, "player left");

        let phase = session.phase;
        if phase == Phase::Lobby {
            session.reset_drawer_order();
        }
        self.broadcast_state(&session);

        let transition = match phase {
            _ if phase.is_active() && session.players.len() < session::MIN_PLAYERS => {
                self.end_game_locked(&mut session);
                Ok(())
            }
            Phase::SelectingWord if was_drawer => {
                session.round.timers.cancel_all();
                self.advance_locked(&mut session)
            }
            Phase::Drawing if was_drawer => {
                self.end_round_locked(&mut session, RoundEndReason::DrawerLeft)
            }
            Phase::Drawing if session.all_guessed() => {
                self.end_round_locked(&mut session, RoundEndReason::AllGuessed)
            }
            _ => Ok(()),
        };
        if let Err(err) = transition {
            warn!(room = %code, error = %err, "transition after leave failed");
        }
        Ok(())
    }

    /// Toggle a player's ready flag. Lobby only.
    pub async fn set_ready(&self, room_code: &str, player_id: &str, is_ready: bool) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::Lobby)?;
        let player = session.player_mut(player_id).ok_or(GameError::PlayerNotFound)?;
        player.is_ready = is_ready;
        self.broadcast_state(&session);
        Ok(())
    }

    /// Merge a partial settings patch. Host only, lobby only.
    pub async fn update_settings(
        &self,
        room_code: &str,
        player_id: &str,
        patch: &SettingsPatch,
    ) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_host(player_id)?;
        session.require_phase(Phase::Lobby)?;

        let player_count = session.players.len();
        session
            .settings
            .apply(patch, &self.inner.config.default_settings, player_count);
        debug!(room = %session.room_code, settings = ?session.settings, "settings updated");
        self.broadcast_state(&session);
        Ok(())
    }

    /// Start the game: shuffle the drawer order and open round one.
    pub async fn start_game(&self, room_code: &str, player_id: &str) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::Lobby)?;
        session.require_host(player_id)?;
        if session.players.len() < session::MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        if !session.players.iter().all(|p| p.is_ready || p.is_host) {
            return Err(GameError::PlayersNotReady);
        }

        session.current_round = 1;
        session.reset_drawer_order();
        session.drawer_order.shuffle(&mut rand::rng());
        for player in &mut session.players {
            player.score = 0;
        }
        info!(room = %session.room_code, players = session.players.len(), "game started");

        self.broadcast(
            &session,
            ServerMessage::GameStarted {
                room_code: session.room_code.clone(),
            },
        );
        self.begin_word_selection(&mut session)
    }

    /// Send a finished room back to the lobby. Host only.
    pub async fn rematch(&self, room_code: &str, player_id: &str, mode: RematchMode) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::GameEnd)?;
        session.require_host(player_id)?;

        session.round.timers.cancel_all();
        session.phase = Phase::Lobby;
        session.current_round = 0;
        session.round = RoundState::default();
        session.round_seq = session.round_seq.wrapping_add(1);
        for player in &mut session.players {
            player.score = 0;
            player.is_ready = mode == RematchMode::SameSettings && !player.is_host;
        }
        session.reset_drawer_order();
        info!(room = %session.room_code, ?mode, "rematch");

        self.broadcast_state(&session);
        self.broadcast(
            &session,
            ServerMessage::RematchStarted {
                room_code: session.room_code.clone(),
                mode,
            },
        );
        Ok(())
    }
}
