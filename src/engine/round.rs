//! Word selection, drawing, guessing and round/game progression.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::timer::TimerKind;
use super::{ChatOutcome, GameEngine};
use crate::error::{GameError, Result};
use crate::protocol::{RoundEndReason, ServerMessage, StrokeEvent};
use crate::rules;
use crate::session::{self, now_millis, DrawPoint, Phase, RoundState, Session, Settings, Stroke};
use crate::words::{TieredWordSupply, WordSupply};

/// A stroke as submitted by the drawer, before defaults and caps apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewStroke {
    pub stroke_id: String,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub points: Vec<DrawPoint>,
}

/// Lowercase, trim and drop blank candidates.
fn normalize_options(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Epoch-millisecond deadline `after` from now.
fn deadline_millis(after: Duration) -> i64 {
    now_millis().saturating_add(i64::try_from(after.as_millis()).unwrap_or(i64::MAX))
}

impl GameEngine {
    // ── Word selection ──────────────────────────────────────────────

    /// Enter `selecting_word` for the drawer under the cursor.
    pub(super) fn begin_word_selection(&self, session: &mut Session) -> Result<()> {
        session.round.timers.cancel_all();
        let drawer_id = session
            .drawer_order
            .get(session.drawer_index)
            .cloned()
            .ok_or(GameError::NoDrawer)?;

        let window = self.inner.config.word_select_window;
        let mut options = normalize_options(self.inner.words.pick(&session.settings));
        if options.is_empty() {
            warn!(room = %session.room_code, "word supply offered nothing, using built-in words");
            options = normalize_options(TieredWordSupply::default().pick(&Settings::default()));
        }
        let select_ends_at = deadline_millis(window);

        session.round_seq = session.round_seq.wrapping_add(1);
        session.phase = Phase::SelectingWord;
        session.round = RoundState {
            drawer_id: Some(drawer_id.clone()),
            word_options: options.clone(),
            word_select_ends_at: Some(select_ends_at),
            ..RoundState::default()
        };
        debug!(
            room = %session.room_code,
            drawer = %drawer_id,
            round = session.current_round,
            "word selection started"
        );

        self.broadcast_state(session);
        if let Some(connection) = session.connection_of(&drawer_id) {
            self.send_to(
                connection,
                ServerMessage::WordOptions {
                    room_code: session.room_code.clone(),
                    options,
                    select_ends_at,
                },
            );
        }
        self.arm(session, window, TimerKind::WordSelect);
        Ok(())
    }

    /// The drawer picks one of the offered words.
    pub async fn select_word(&self, room_code: &str, player_id: &str, word: &str) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::SelectingWord)?;
        session.require_drawer(player_id)?;

        let word = word.trim().to_lowercase();
        if word.is_empty() || !session.round.word_options.contains(&word) {
            return Err(GameError::InvalidWord);
        }
        self.apply_word(&mut session, word);
        Ok(())
    }

    /// Start drawing `word`. Shared by manual and automatic selection.
    pub(super) fn apply_word(&self, session: &mut Session, word: String) {
        session.round.timers.cancel_all();

        let duration = Duration::from_secs(session.settings.round_duration_sec);
        let ends_at = deadline_millis(duration);

        session.phase = Phase::Drawing;
        session.round.word_options.clear();
        session.round.word_select_ends_at = None;
        session.round.revealed.clear();
        session.round.mask = rules::build_mask(&word, &session.round.revealed);
        session.round.ends_at = Some(ends_at);
        session.round.deadline = Some(Instant::now() + duration);
        session.round.word = Some(word.clone());

        let room_code = session.room_code.clone();
        let drawer_id = session.round.drawer_id.clone().unwrap_or_default();
        info!(room = %room_code, drawer = %drawer_id, "drawing started");

        self.broadcast_state(session);
        self.broadcast(
            session,
            ServerMessage::CanvasClear {
                room_code: room_code.clone(),
            },
        );
        self.broadcast(
            session,
            ServerMessage::RoundStart {
                room_code: room_code.clone(),
                drawer_id,
                mask: session.round.mask.clone(),
                ends_at,
            },
        );
        if let Some(connection) = session.drawer_connection() {
            self.send_to(connection, ServerMessage::RoundWord { room_code, word });
        }

        self.arm(session, duration / 2, TimerKind::RevealHint);
        self.arm(session, duration * 3 / 4, TimerKind::RevealHint);
        self.arm(session, duration, TimerKind::RoundEnd);
    }

    /// Reveal one more letter and tell the room.
    pub(super) fn reveal_hint(&self, session: &mut Session) {
        let Some(word) = session.round.word.clone() else {
            return;
        };
        if rules::reveal_random_letter(&word, &mut session.round.revealed).is_none() {
            return;
        }
        session.round.mask = rules::build_mask(&word, &session.round.revealed);
        self.broadcast(
            session,
            ServerMessage::RoundMask {
                room_code: session.room_code.clone(),
                mask: session.round.mask.clone(),
            },
        );
        self.broadcast_state(session);
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// Append a stroke and relay it to the room. Strokes without points are
    /// dropped silently.
    pub async fn add_stroke(&self, room_code: &str, player_id: &str, stroke: NewStroke) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::Drawing)?;
        session.require_drawer(player_id)?;

        let NewStroke {
            stroke_id,
            color,
            width,
            mut points,
        } = stroke;
        points.truncate(self.inner.config.max_points_per_stroke);
        if points.is_empty() {
            return Ok(());
        }

        let stroke = Stroke {
            stroke_id,
            drawer_id: player_id.to_string(),
            color: color
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| session::DEFAULT_COLOR.to_string()),
            width: session::clamp_width(width),
            points,
            created_at: now_millis(),
        };

        let strokes = &mut session.round.strokes;
        strokes.push_back(stroke.clone());
        while strokes.len() > self.inner.config.max_strokes_per_round {
            strokes.pop_front();
        }

        self.broadcast(
            &session,
            ServerMessage::DrawStroke(Box::new(StrokeEvent {
                room_code: session.room_code.clone(),
                stroke,
            })),
        );
        Ok(())
    }

    /// Wipe the canvas.
    pub async fn clear_canvas(&self, room_code: &str, player_id: &str) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::Drawing)?;
        session.require_drawer(player_id)?;

        session.round.strokes.clear();
        self.broadcast(
            &session,
            ServerMessage::CanvasClear {
                room_code: session.room_code.clone(),
            },
        );
        Ok(())
    }

    /// Drop the newest stroke, then clear and replay the rest in one event.
    ///
    /// Returns `false` if there was nothing to undo.
    pub async fn undo_stroke(&self, room_code: &str, player_id: &str) -> Result<bool> {
        let mut session = self.lock_room(room_code).await?;
        session.require_phase(Phase::Drawing)?;
        session.require_drawer(player_id)?;

        if session.round.strokes.pop_back().is_none() {
            return Ok(false);
        }
        self.broadcast(
            &session,
            ServerMessage::CanvasClear {
                room_code: session.room_code.clone(),
            },
        );
        self.broadcast(
            &session,
            ServerMessage::DrawReplay {
                room_code: session.room_code.clone(),
                strokes: session.round.strokes.iter().cloned().collect(),
            },
        );
        Ok(true)
    }

    // ── Chat and guessing ───────────────────────────────────────────

    /// Relay a chat line and, while drawing, check it as a guess.
    pub async fn handle_chat_send(
        &self,
        room_code: &str,
        player_id: &str,
        text: &str,
    ) -> Result<ChatOutcome> {
        let mut session = self.lock_room(room_code).await?;
        let cooldown = self.inner.config.chat_cooldown;
        let now = Instant::now();

        let player = session.player_mut(player_id).ok_or(GameError::PlayerNotFound)?;
        if let Some(last) = player.last_chat_at {
            if now.saturating_duration_since(last) < cooldown {
                return Ok(ChatOutcome::RateLimited);
            }
        }
        player.last_chat_at = Some(now);
        let name = player.name.clone();

        let text = text.trim();
        if text.is_empty() {
            return Ok(ChatOutcome::Empty);
        }

        self.broadcast(
            &session,
            ServerMessage::ChatMessage {
                room_code: session.room_code.clone(),
                player_id: player_id.to_string(),
                name: name.clone(),
                text: text.to_string(),
                ts: now_millis(),
            },
        );

        if session.phase != Phase::Drawing
            || session.round.is_drawer(player_id)
            || session.round.has_guessed(player_id)
        {
            return Ok(ChatOutcome::Message);
        }
        let Some(word) = session.round.word.as_deref() else {
            return Ok(ChatOutcome::Message);
        };
        if !rules::is_correct_guess(text, word) {
            return Ok(ChatOutcome::Message);
        }

        let order_index = session.round.guessed.len();
        session.round.guessed.push(player_id.to_string());

        let round_duration = Duration::from_secs(session.settings.round_duration_sec);
        let time_left = session
            .round
            .deadline
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or_default();
        let points = rules::guess_points(rules::time_left_ratio(time_left, round_duration), order_index);

        if let Some(guesser) = session.player_mut(player_id) {
            guesser.score = guesser.score.saturating_add(points);
        }
        let bonus = self.inner.config.drawer_bonus;
        if let Some(drawer_id) = session.round.drawer_id.clone() {
            if let Some(drawer) = session.player_mut(&drawer_id) {
                drawer.score = drawer.score.saturating_add(bonus);
            }
        }
        info!(room = %session.room_code, player = %player_id, points, order_index, "correct guess");

        self.broadcast(
            &session,
            ServerMessage::GuessCorrect {
                room_code: session.room_code.clone(),
                player_id: player_id.to_string(),
                name,
                points,
            },
        );
        self.broadcast(
            &session,
            ServerMessage::ScoreUpdate {
                room_code: session.room_code.clone(),
                scores: session.scores(),
            },
        );
        self.broadcast_state(&session);

        if session.all_guessed() {
            if let Err(err) = self.end_round_locked(&mut session, RoundEndReason::AllGuessed) {
                warn!(room = %session.room_code, error = %err, "failed to end round after last guess");
            }
        }
        Ok(ChatOutcome::CorrectGuess { points })
    }

    // ── Progression ─────────────────────────────────────────────────

    /// End the current round and reveal the word.
    ///
    /// Fails with [`GameError::NoActiveWord`] if no word was ever chosen this
    /// round. Calling it again after the round already ended is a no-op.
    pub async fn end_round(&self, room_code: &str, reason: RoundEndReason) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        self.end_round_locked(&mut session, reason)
    }

    pub(super) fn end_round_locked(&self, session: &mut Session, reason: RoundEndReason) -> Result<()> {
        let word = session.round.word.clone().ok_or(GameError::NoActiveWord)?;
        if session.phase != Phase::Drawing {
            return Ok(());
        }

        session.round.timers.cancel_all();
        session.phase = Phase::RoundEnd;
        info!(room = %session.room_code, ?reason, "round ended");

        self.broadcast_state(session);
        self.broadcast(
            session,
            ServerMessage::RoundEnd {
                room_code: session.room_code.clone(),
                word,
                reason,
            },
        );
        let pause = self.inner.config.round_end_pause;
        self.arm(session, pause, TimerKind::NextRound);
        Ok(())
    }

    /// Move to the next drawer, the next round, or the end of the game.
    pub async fn advance_game(&self, room_code: &str) -> Result<()> {
        let mut session = self.lock_room(room_code).await?;
        self.advance_locked(&mut session)
    }

    pub(super) fn advance_locked(&self, session: &mut Session) -> Result<()> {
        if session.players.len() < session::MIN_PLAYERS {
            self.end_game_locked(session);
            return Ok(());
        }

        let cursor = session.drawer_index.saturating_add(1);
        session.prune_drawer_order(cursor);
        if session.drawer_index >= session.drawer_order.len() {
            session.drawer_index = 0;
            session.current_round = session.current_round.saturating_add(1);
            if session.current_round > session.settings.max_rounds {
                self.end_game_locked(session);
                return Ok(());
            }
        }
        self.begin_word_selection(session)
    }

    /// Enter `game_end` and publish the final leaderboard.
    pub(super) fn end_game_locked(&self, session: &mut Session) {
        session.round.timers.cancel_all();
        session.phase = Phase::GameEnd;
        let leaderboard = session.leaderboard();
        info!(room = %session.room_code, players = session.players.len(), "game ended");

        self.broadcast_state(session);
        self.broadcast(
            session,
            ServerMessage::GameEnded {
                room_code: session.room_code.clone(),
                leaderboard,
            },
        );
    }
}
