//! In-memory state of one room.
//!
//! A [`Session`] is owned by the engine; the registry only hands out
//! references to it. Helpers here are synchronous and never emit events.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::{GameError, Result};
use crate::protocol::{
    LeaderboardEntry, PlayerPublic, RoomStatePublic, RoundPublic, ScoreEntry, SettingsPublic,
    SyncStatePayload,
};
use crate::transport::ConnectionId;

/// Client-generated player identity; survives reconnects.
pub type PlayerId = String;

/// A normalized 2-D canvas coordinate.
pub type DrawPoint = [f64; 2];

/// Allowed values for [`Settings::max_rounds`].
pub const ALLOWED_ROUNDS: [u32; 4] = [1, 3, 5, 7];

/// Allowed values for [`Settings::round_duration_sec`].
pub const ALLOWED_DURATIONS: [u64; 3] = [60, 80, 100];

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 12;

pub const MIN_WIDTH: f64 = 1.0;
pub const MAX_WIDTH: f64 = 40.0;
pub const DEFAULT_WIDTH: f64 = 4.0;
pub const DEFAULT_COLOR: &str = "#000000";

const MIN_CUSTOM_WORD_LEN: usize = 2;
const MAX_CUSTOM_WORD_LEN: usize = 30;
const MAX_CUSTOM_WORDS: usize = 250;

// ── Phase ───────────────────────────────────────────────────────────

/// Room lifecycle phase.
///
/// ```text
/// lobby ──start──▶ selecting_word ──pick/timeout──▶ drawing
///   ▲                    ▲                             │ all guessed / timeout
///   │ rematch            │ pause elapsed               ▼
/// game_end ◀──rounds exhausted / <2 players── round_end
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Lobby,
    SelectingWord,
    Drawing,
    RoundEnd,
    GameEnd,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::SelectingWord => "selecting_word",
            Self::Drawing => "drawing",
            Self::RoundEnd => "round_end",
            Self::GameEnd => "game_end",
        }
    }

    /// Phases during which a game is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::SelectingWord | Self::Drawing | Self::RoundEnd)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Host-configurable room settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub max_players: usize,
    pub max_rounds: u32,
    pub round_duration_sec: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_words: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_players: 8,
            max_rounds: 5,
            round_duration_sec: 80,
            custom_words: Vec::new(),
        }
    }
}

impl Settings {
    /// Merge a partial patch. Each field is validated on its own; values
    /// outside their domain fall back to `defaults` (rounds, duration) or are
    /// ignored (max players below the current head count).
    pub fn apply(&mut self, patch: &SettingsPatch, defaults: &Settings, player_count: usize) {
        if let Some(rounds) = patch.max_rounds {
            self.max_rounds = ALLOWED_ROUNDS
                .iter()
                .copied()
                .find(|allowed| f64::from(*allowed) == rounds)
                .unwrap_or(defaults.max_rounds);
        }
        if let Some(duration) = patch.round_duration_sec {
            self.round_duration_sec = ALLOWED_DURATIONS
                .iter()
                .copied()
                .find(|allowed| *allowed as f64 == duration)
                .unwrap_or(defaults.round_duration_sec);
        }
        if let Some(max_players) = patch.max_players.filter(|v| v.is_finite()) {
            let clamped = (max_players.floor() as i64).clamp(MIN_PLAYERS as i64, MAX_PLAYERS as i64);
            let clamped = usize::try_from(clamped).unwrap_or(MIN_PLAYERS);
            if clamped >= player_count {
                self.max_players = clamped;
            }
        }
        if let Some(words) = &patch.custom_words {
            self.custom_words = sanitize_custom_words(words);
        }
    }

    /// Snap every field into its domain using the same checks as
    /// [`Settings::apply`], with [`Settings::default`] as the fallback.
    pub fn validated(self) -> Self {
        let patch = SettingsPatch {
            max_rounds: Some(f64::from(self.max_rounds)),
            round_duration_sec: Some(self.round_duration_sec as f64),
            max_players: Some(self.max_players as f64),
            custom_words: Some(self.custom_words),
        };
        let defaults = Settings::default();
        let mut settings = defaults.clone();
        settings.apply(&patch, &defaults, 0);
        settings
    }

    pub fn to_public(&self) -> SettingsPublic {
        SettingsPublic {
            max_players: self.max_players,
            max_rounds: self.max_rounds,
            round_duration_sec: self.round_duration_sec,
            custom_word_count: self.custom_words.len(),
        }
    }
}

/// Trim, collapse inner whitespace, keep 2–30 character entries, drop
/// case-insensitive duplicates and cap the list.
pub fn sanitize_custom_words(words: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .iter()
        .map(|w| w.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|w| (MIN_CUSTOM_WORD_LEN..=MAX_CUSTOM_WORD_LEN).contains(&w.chars().count()))
        .filter(|w| seen.insert(w.to_lowercase()))
        .take(MAX_CUSTOM_WORDS)
        .collect()
}

/// Partial settings update sent by the host.
///
/// Unknown fields are ignored and fields of the wrong type deserialize as
/// absent, so a sloppy patch never rejects the whole command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub round_duration_sec: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_players: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub custom_words: Option<Vec<String>>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// ── Player ──────────────────────────────────────────────────────────

/// A member of a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: PlayerId,
    /// Current transport connection; replaced on rejoin/reconnect.
    pub connection: ConnectionId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub is_connected: bool,
    pub is_ready: bool,
    /// Epoch milliseconds; drives host succession.
    pub joined_at: i64,
    /// Last accepted chat line, for rate limiting.
    pub last_chat_at: Option<Instant>,
}

impl Player {
    pub fn new(player_id: PlayerId, name: String, connection: ConnectionId) -> Self {
        Self {
            player_id,
            connection,
            name,
            score: 0,
            is_host: false,
            is_connected: true,
            is_ready: false,
            joined_at: now_millis(),
            last_chat_at: None,
        }
    }
}

// ── Strokes ─────────────────────────────────────────────────────────

/// One continuous pen-down-to-pen-up gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub stroke_id: String,
    pub drawer_id: PlayerId,
    pub color: String,
    pub width: f64,
    pub points: Vec<DrawPoint>,
    pub created_at: i64,
}

/// Clamp a client-supplied pen width into `[1, 40]`; junk becomes the default.
pub fn clamp_width(width: Option<f64>) -> f64 {
    match width {
        Some(w) if w.is_finite() => w.clamp(MIN_WIDTH, MAX_WIDTH),
        _ => DEFAULT_WIDTH,
    }
}

// ── Round ───────────────────────────────────────────────────────────

/// Cancellation tokens for the timers armed by the current phase.
///
/// Dropping the set aborts every task still pending.
#[derive(Debug, Default)]
pub struct RoundTimers {
    handles: Vec<AbortHandle>,
}

impl RoundTimers {
    pub fn push(&mut self, handle: AbortHandle) {
        self.handles.push(handle);
    }

    /// Abort and forget every armed timer.
    pub fn cancel_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for RoundTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// State of the current drawer's turn. Rebuilt at every word selection.
#[derive(Debug, Default)]
pub struct RoundState {
    pub drawer_id: Option<PlayerId>,
    /// The secret. Never part of any snapshot.
    pub word: Option<String>,
    pub word_options: Vec<String>,
    pub word_select_ends_at: Option<i64>,
    pub mask: String,
    /// Indices of `word` already revealed in `mask`.
    pub revealed: BTreeSet<usize>,
    /// Wall-clock deadline sent to clients.
    pub ends_at: Option<i64>,
    /// Monotonic deadline used for scoring.
    pub deadline: Option<Instant>,
    pub strokes: VecDeque<Stroke>,
    /// Correct guessers, in arrival order.
    pub guessed: Vec<PlayerId>,
    pub timers: RoundTimers,
}

impl RoundState {
    pub fn has_guessed(&self, player_id: &str) -> bool {
        self.guessed.iter().any(|id| id == player_id)
    }

    pub fn is_drawer(&self, player_id: &str) -> bool {
        self.drawer_id.as_deref() == Some(player_id)
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// One room.
#[derive(Debug)]
pub struct Session {
    pub room_code: String,
    pub created_at: i64,
    pub host_player_id: PlayerId,
    pub phase: Phase,
    /// Join order.
    pub players: Vec<Player>,
    pub settings: Settings,
    pub current_round: u32,
    pub drawer_order: Vec<PlayerId>,
    pub drawer_index: usize,
    pub round: RoundState,
    /// Bumped whenever a new round state is installed; timers armed for an
    /// older value are stale.
    pub round_seq: u64,
    /// Set once the last player left and the room was unregistered.
    pub closed: bool,
}

impl Session {
    /// Create a lobby with `host` as its only member.
    pub fn new(room_code: String, mut host: Player, settings: Settings) -> Self {
        host.is_host = true;
        Self {
            room_code,
            created_at: now_millis(),
            host_player_id: host.player_id.clone(),
            phase: Phase::Lobby,
            drawer_order: vec![host.player_id.clone()],
            players: vec![host],
            settings,
            current_round: 0,
            drawer_index: 0,
            round: RoundState::default(),
            round_seq: 0,
            closed: false,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn require_player(&self, player_id: &str) -> Result<&Player> {
        self.player(player_id).ok_or(GameError::PlayerNotFound)
    }

    pub fn require_host(&self, player_id: &str) -> Result<()> {
        if self.host_player_id == player_id {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    pub fn require_drawer(&self, player_id: &str) -> Result<()> {
        if self.round.is_drawer(player_id) {
            Ok(())
        } else {
            Err(GameError::NotDrawer)
        }
    }

    pub fn require_phase(&self, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::invalid_phase(expected, self.phase))
        }
    }

    pub fn connection_of(&self, player_id: &str) -> Option<ConnectionId> {
        self.player(player_id).map(|p| p.connection)
    }

    pub fn drawer_connection(&self) -> Option<ConnectionId> {
        self.round
            .drawer_id
            .as_deref()
            .and_then(|id| self.connection_of(id))
    }

    /// Drawer rotation follows join order while the lobby forms.
    pub fn reset_drawer_order(&mut self) {
        self.drawer_order = self.players.iter().map(|p| p.player_id.clone()).collect();
        self.drawer_index = 0;
    }

    /// Drop departed players from the rotation and move the cursor to the
    /// first surviving entry at or after `cursor`. The result may equal
    /// `drawer_order.len()`, meaning the rotation has wrapped.
    pub fn prune_drawer_order(&mut self, cursor: usize) {
        let present: HashSet<&str> = self.players.iter().map(|p| p.player_id.as_str()).collect();
        let mut rebased = 0;
        let mut kept = Vec::with_capacity(self.drawer_order.len());
        for (pos, id) in self.drawer_order.drain(..).enumerate() {
            if present.contains(id.as_str()) {
                if pos < cursor {
                    rebased += 1;
                }
                kept.push(id);
            }
        }
        self.drawer_order = kept;
        self.drawer_index = rebased;
        if self.drawer_order.is_empty() {
            self.reset_drawer_order();
        }
    }

    /// Remove a player, handing the host role to the longest-tenured
    /// remaining player if needed. Ties on `joined_at` go to the earlier entry
    /// in join order.
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.player_id == player_id)?;
        let removed = self.players.remove(idx);
        self.round.guessed.retain(|id| id != player_id);

        if self.host_player_id == player_id {
            let next_host = self
                .players
                .iter()
                .enumerate()
                .min_by_key(|(pos, p)| (p.joined_at, *pos))
                .map(|(_, p)| p.player_id.clone());
            if let Some(next_host) = next_host {
                for p in &mut self.players {
                    p.is_host = p.player_id == next_host;
                }
                self.host_player_id = next_host;
            }
        }
        Some(removed)
    }

    /// Players other than the drawer.
    pub fn guessers(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(move |p| !self.round.is_drawer(&p.player_id))
    }

    /// `true` once at least one guesser exists and all of them guessed.
    pub fn all_guessed(&self) -> bool {
        let mut guessers = self.guessers().peekable();
        guessers.peek().is_some() && self.guessers().all(|p| self.round.has_guessed(&p.player_id))
    }

    /// Players sorted by score, highest first; ties keep join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
            .into_iter()
            .map(|p| LeaderboardEntry {
                player_id: p.player_id.clone(),
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }

    pub fn scores(&self) -> Vec<ScoreEntry> {
        self.players
            .iter()
            .map(|p| ScoreEntry {
                player_id: p.player_id.clone(),
                score: p.score,
            })
            .collect()
    }

    /// Snapshot safe to broadcast: never contains the word or its options.
    pub fn to_public_state(&self) -> RoomStatePublic {
        RoomStatePublic {
            room_code: self.room_code.clone(),
            created_at: self.created_at,
            host_player_id: self.host_player_id.clone(),
            phase: self.phase,
            players: self
                .players
                .iter()
                .map(|p| PlayerPublic {
                    player_id: p.player_id.clone(),
                    name: p.name.clone(),
                    score: p.score,
                    is_host: p.is_host,
                    is_connected: p.is_connected,
                    is_ready: p.is_ready,
                    has_guessed: self.round.has_guessed(&p.player_id),
                })
                .collect(),
            settings: self.settings.to_public(),
            current_round: self.current_round,
            drawer_index: self.drawer_index,
            drawer_order: self.drawer_order.clone(),
            round: RoundPublic {
                drawer_id: self.round.drawer_id.clone(),
                mask: self.round.mask.clone(),
                ends_at: self.round.ends_at,
                word_select_ends_at: self.round.word_select_ends_at,
            },
        }
    }

    /// Catch-up snapshot for `player_id`. Word options are included only for
    /// the drawer while the word is being selected.
    pub fn sync_state(&self, player_id: &str) -> SyncStatePayload {
        let word_options = (self.phase == Phase::SelectingWord
            && self.player(player_id).is_some()
            && self.round.is_drawer(player_id))
        .then(|| self.round.word_options.clone());

        SyncStatePayload {
            room_code: self.room_code.clone(),
            phase: self.phase,
            current_round: self.current_round,
            drawer_id: self.round.drawer_id.clone(),
            mask: self.round.mask.clone(),
            ends_at: self.round.ends_at,
            word_select_ends_at: self.round.word_select_ends_at,
            strokes: self.round.strokes.iter().cloned().collect(),
            word_options,
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
