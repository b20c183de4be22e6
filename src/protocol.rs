//! Wire protocol between player connections and the session engine.
//!
//! Every frame is a JSON object `{"type": "<event>", "data": {...}}`. Event
//! names keep the `namespace:action` form clients already speak, and payload
//! fields are camelCase.

use serde::{Deserialize, Serialize};

use crate::error_codes::ErrorCode;
use crate::session::{DrawPoint, Phase, PlayerId, SettingsPatch, Stroke};

// ── Enums ───────────────────────────────────────────────────────────

/// How a finished room re-forms its lobby.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RematchMode {
    /// Everyone must ready up again.
    #[default]
    Fresh,
    /// Non-host players start out ready.
    SameSettings,
}

/// Why a round ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    /// The round timer elapsed.
    Time,
    /// Every non-drawer guessed the word.
    AllGuessed,
    /// The drawer left mid-round.
    DrawerLeft,
}

// ── Snapshots ───────────────────────────────────────────────────────

/// A player as seen by everyone in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPublic {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub is_connected: bool,
    pub is_ready: bool,
    pub has_guessed: bool,
}

/// Room settings as broadcast to clients. Custom words stay server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPublic {
    pub max_players: usize,
    pub max_rounds: u32,
    pub round_duration_sec: u64,
    pub custom_word_count: usize,
}

/// Public part of the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundPublic {
    pub drawer_id: Option<PlayerId>,
    pub mask: String,
    pub ends_at: Option<i64>,
    pub word_select_ends_at: Option<i64>,
}

/// Full room snapshot, broadcast on every membership, phase or score change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatePublic {
    pub room_code: String,
    pub created_at: i64,
    pub host_player_id: PlayerId,
    pub phase: Phase,
    pub players: Vec<PlayerPublic>,
    pub settings: SettingsPublic,
    pub current_round: u32,
    pub drawer_index: usize,
    pub drawer_order: Vec<PlayerId>,
    pub round: RoundPublic,
}

/// Catch-up snapshot for a (re)joining player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatePayload {
    pub room_code: String,
    pub phase: Phase,
    pub current_round: u32,
    pub drawer_id: Option<PlayerId>,
    pub mask: String,
    pub ends_at: Option<i64>,
    pub word_select_ends_at: Option<i64>,
    pub strokes: Vec<Stroke>,
    /// Present only for the drawer while the word is being selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_options: Option<Vec<String>>,
}

/// Reply to a successful create or join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedPayload {
    pub room_code: String,
    pub state: RoomStatePublic,
}

/// A stroke as relayed to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeEvent {
    pub room_code: String,
    #[serde(flatten)]
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub score: u32,
}

// ── Client → Server ─────────────────────────────────────────────────

/// Commands a player connection sends to the engine.
///
/// String fields default to empty so that a missing field is reported as
/// invalid input by the gateway rather than as a malformed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "room:create")]
    CreateRoom {
        #[serde(default)]
        name: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "room:join")]
    JoinRoom {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "reconnect:hello")]
    ReconnectHello {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "room:leave")]
    LeaveRoom {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "lobby:ready")]
    SetReady {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        is_ready: bool,
    },
    #[serde(rename = "room:updateSettings")]
    UpdateSettings {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        settings: SettingsPatch,
    },
    #[serde(rename = "game:start")]
    StartGame {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "round:selectWord")]
    SelectWord {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        word: String,
    },
    #[serde(rename = "draw:stroke")]
    DrawStroke {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        stroke_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default)]
        points: Vec<DrawPoint>,
    },
    #[serde(rename = "draw:clear")]
    ClearCanvas {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "draw:undo")]
    UndoStroke {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "chat:send")]
    ChatSend {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "sync:request")]
    SyncRequest {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    #[serde(rename = "game:rematch")]
    Rematch {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        mode: RematchMode,
    },
}

impl ClientMessage {
    /// The wire name of this command, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "room:create",
            Self::JoinRoom { .. } => "room:join",
            Self::ReconnectHello { .. } => "reconnect:hello",
            Self::LeaveRoom { .. } => "room:leave",
            Self::SetReady { .. } => "lobby:ready",
            Self::UpdateSettings { .. } => "room:updateSettings",
            Self::StartGame { .. } => "game:start",
            Self::SelectWord { .. } => "round:selectWord",
            Self::DrawStroke { .. } => "draw:stroke",
            Self::ClearCanvas { .. } => "draw:clear",
            Self::UndoStroke { .. } => "draw:undo",
            Self::ChatSend { .. } => "chat:send",
            Self::SyncRequest { .. } => "sync:request",
            Self::Rematch { .. } => "game:rematch",
        }
    }
}

// ── Server → Client ─────────────────────────────────────────────────

/// Events the engine delivers to one connection or to a whole room.
///
/// Large payloads are boxed to keep the enum small on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent to the creator only.
    #[serde(rename = "room:created")]
    RoomCreated(Box<RoomJoinedPayload>),
    /// Sent to the joiner only.
    #[serde(rename = "room:joined")]
    RoomJoined(Box<RoomJoinedPayload>),
    #[serde(rename = "room:state")]
    RoomState(Box<RoomStatePublic>),
    /// A command failed. Sent to the issuing connection only.
    #[serde(rename = "room:error")]
    RoomError {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },
    #[serde(rename = "game:started")]
    GameStarted { room_code: String },
    #[serde(rename = "game:ended")]
    GameEnded {
        room_code: String,
        leaderboard: Vec<LeaderboardEntry>,
    },
    #[serde(rename = "game:rematchStarted")]
    RematchStarted { room_code: String, mode: RematchMode },
    /// Candidate words. Drawer only.
    #[serde(rename = "round:wordOptions")]
    WordOptions {
        room_code: String,
        options: Vec<String>,
        select_ends_at: i64,
    },
    #[serde(rename = "round:start")]
    RoundStart {
        room_code: String,
        drawer_id: PlayerId,
        mask: String,
        ends_at: i64,
    },
    /// The secret word. Drawer only.
    #[serde(rename = "round:word")]
    RoundWord { room_code: String, word: String },
    #[serde(rename = "round:mask")]
    RoundMask { room_code: String, mask: String },
    #[serde(rename = "round:end")]
    RoundEnd {
        room_code: String,
        word: String,
        reason: RoundEndReason,
    },
    #[serde(rename = "draw:stroke")]
    DrawStroke(Box<StrokeEvent>),
    #[serde(rename = "draw:clear")]
    CanvasClear { room_code: String },
    /// Every retained stroke, oldest first. Replaces the canvas contents.
    #[serde(rename = "draw:replay")]
    DrawReplay {
        room_code: String,
        strokes: Vec<Stroke>,
    },
    #[serde(rename = "chat:message")]
    ChatMessage {
        room_code: String,
        player_id: PlayerId,
        name: String,
        text: String,
        ts: i64,
    },
    /// Never carries the word.
    #[serde(rename = "guess:correct")]
    GuessCorrect {
        room_code: String,
        player_id: PlayerId,
        name: String,
        points: u32,
    },
    #[serde(rename = "score:update")]
    ScoreUpdate {
        room_code: String,
        scores: Vec<ScoreEntry>,
    },
    #[serde(rename = "sync:state")]
    SyncState(Box<SyncStatePayload>),
}

impl ServerMessage {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => "room:created",
            Self::RoomJoined(_) => "room:joined",
            Self::RoomState(_) => "room:state",
            Self::RoomError { .. } => "room:error",
            Self::GameStarted { .. } => "game:started",
            Self::GameEnded { .. } => "game:ended",
            Self::RematchStarted { .. } => "game:rematchStarted",
            Self::WordOptions { .. } => "round:wordOptions",
            Self::RoundStart { .. } => "round:start",
            Self::RoundWord { .. } => "round:word",
            Self::RoundMask { .. } => "round:mask",
            Self::RoundEnd { .. } => "round:end",
            Self::DrawStroke(_) => "draw:stroke",
            Self::CanvasClear { .. } => "draw:clear",
            Self::DrawReplay { .. } => "draw:replay",
            Self::ChatMessage { .. } => "chat:message",
            Self::GuessCorrect { .. } => "guess:correct",
            Self::ScoreUpdate { .. } => "score:update",
            Self::SyncState(_) => "sync:state",
        }
    }
}
