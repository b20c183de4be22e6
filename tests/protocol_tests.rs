#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for the session protocol.
//!
//! Client fixtures are the frames a browser actually sends; server-side tests
//! pin the exact JSON shape of the events the engine emits.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sketch_session::error_codes::ErrorCode;
use sketch_session::protocol::{
    ClientMessage, LeaderboardEntry, PlayerPublic, RematchMode, RoomJoinedPayload,
    RoomStatePublic, RoundEndReason, RoundPublic, ScoreEntry, ServerMessage, SettingsPublic,
    SyncStatePayload,
};
use sketch_session::session::{SettingsPatch, Stroke};
use sketch_session::Phase;

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

fn parse(json: &str) -> ClientMessage {
    serde_json::from_str(json).expect("deserialize")
}

fn to_value(msg: &ServerMessage) -> Value {
    serde_json::to_value(msg).expect("serialize")
}

fn sample_state() -> RoomStatePublic {
    RoomStatePublic {
        room_code: "K7P2QX".into(),
        created_at: 1_700_000_000_000,
        host_player_id: "p-ann".into(),
        phase: Phase::Drawing,
        players: vec![PlayerPublic {
            player_id: "p-ann".into(),
            name: "Ann".into(),
            score: 125,
            is_host: true,
            is_connected: true,
            is_ready: false,
            has_guessed: false,
        }],
        settings: SettingsPublic {
            max_players: 8,
            max_rounds: 3,
            round_duration_sec: 80,
            custom_word_count: 0,
        },
        current_round: 2,
        drawer_index: 0,
        drawer_order: vec!["p-ann".into()],
        round: RoundPublic {
            drawer_id: Some("p-ann".into()),
            mask: "_ _ _".into(),
            ends_at: Some(1_700_000_080_000),
            word_select_ends_at: None,
        },
    }
}

// ════════════════════════════════════════════════════════════════════
// Client fixtures
// ════════════════════════════════════════════════════════════════════

#[test]
fn fixture_create_and_join() {
    let msg = parse(r#"{"type":"room:create","data":{"name":"Ann","playerId":"p-ann"}}"#);
    assert_eq!(
        msg,
        ClientMessage::CreateRoom {
            name: "Ann".into(),
            player_id: "p-ann".into(),
        }
    );

    let msg = parse(
        r#"{
            "type": "room:join",
            "data": {"roomCode": "k7p2qx", "name": "Ben", "playerId": "p-ben"}
        }"#,
    );
    // Codes are normalized by the gateway, not the codec.
    assert_eq!(
        msg,
        ClientMessage::JoinRoom {
            room_code: "k7p2qx".into(),
            name: "Ben".into(),
            player_id: "p-ben".into(),
        }
    );
}

#[test]
fn fixture_lobby_commands() {
    let msg = parse(
        r#"{"type":"lobby:ready","data":{"roomCode":"K7P2QX","playerId":"p-ben","isReady":true}}"#,
    );
    assert!(matches!(msg, ClientMessage::SetReady { is_ready: true, .. }));

    let msg = parse(
        r#"{"type":"room:leave","data":{"roomCode":"K7P2QX","playerId":"p-ben"}}"#,
    );
    assert_eq!(msg.name(), "room:leave");

    let msg = parse(
        r#"{"type":"game:start","data":{"roomCode":"K7P2QX","playerId":"p-ann"}}"#,
    );
    assert_eq!(msg.name(), "game:start");

    let msg = parse(
        r#"{"type":"reconnect:hello","data":{"roomCode":"K7P2QX","playerId":"p-ben"}}"#,
    );
    assert_eq!(
        msg,
        ClientMessage::ReconnectHello {
            room_code: "K7P2QX".into(),
            player_id: "p-ben".into(),
        }
    );
}

#[test]
fn fixture_update_settings_is_lenient() {
    let msg = parse(
        r#"{
            "type": "room:updateSettings",
            "data": {
                "roomCode": "K7P2QX",
                "playerId": "p-ann",
                "settings": {
                    "maxRounds": 3,
                    "roundDurationSec": "fast",
                    "customWords": ["kite", "lamp", "drum"],
                    "theme": "dark"
                }
            }
        }"#,
    );
    let ClientMessage::UpdateSettings { settings, .. } = msg else {
        panic!("expected UpdateSettings");
    };
    assert_eq!(
        settings,
        SettingsPatch {
            max_rounds: Some(3.0),
            round_duration_sec: None,
            max_players: None,
            custom_words: Some(vec!["kite".into(), "lamp".into(), "drum".into()]),
        }
    );
}

#[test]
fn fixture_settings_default_to_empty_patch() {
    let msg = parse(r#"{"type":"room:updateSettings","data":{"roomCode":"A","playerId":"p"}}"#);
    assert!(matches!(
        msg,
        ClientMessage::UpdateSettings { settings, .. } if settings == SettingsPatch::default()
    ));
}

#[test]
fn fixture_draw_commands() {
    let msg = parse(
        r##"{
            "type": "draw:stroke",
            "data": {
                "roomCode": "K7P2QX",
                "playerId": "p-ann",
                "strokeId": "s-1",
                "color": "#ff8800",
                "width": 6,
                "points": [[0.1, 0.2], [0.15, 0.25]]
            }
        }"##,
    );
    assert_eq!(
        msg,
        ClientMessage::DrawStroke {
            room_code: "K7P2QX".into(),
            player_id: "p-ann".into(),
            stroke_id: "s-1".into(),
            color: Some("#ff8800".into()),
            width: Some(6.0),
            points: vec![[0.1, 0.2], [0.15, 0.25]],
        }
    );

    let msg = parse(r#"{"type":"draw:stroke","data":{"roomCode":"K","playerId":"p","strokeId":"s"}}"#);
    assert!(matches!(
        msg,
        ClientMessage::DrawStroke { color: None, width: None, ref points, .. } if points.is_empty()
    ));

    assert_eq!(
        parse(r#"{"type":"draw:undo","data":{"roomCode":"K","playerId":"p"}}"#).name(),
        "draw:undo"
    );
    assert_eq!(
        parse(r#"{"type":"draw:clear","data":{"roomCode":"K","playerId":"p"}}"#).name(),
        "draw:clear"
    );
}

#[test]
fn fixture_chat_sync_and_rematch() {
    let msg = parse(
        r#"{"type":"chat:send","data":{"roomCode":"K7P2QX","playerId":"p-ben","text":"is it a cat?"}}"#,
    );
    assert!(matches!(msg, ClientMessage::ChatSend { ref text, .. } if text == "is it a cat?"));

    let msg = parse(r#"{"type":"sync:request","data":{"roomCode":"K7P2QX","playerId":"p-ben"}}"#);
    assert_eq!(msg.name(), "sync:request");

    let msg = parse(
        r#"{"type":"game:rematch","data":{"roomCode":"K7P2QX","playerId":"p-ann","mode":"same_settings"}}"#,
    );
    assert!(matches!(
        msg,
        ClientMessage::Rematch { mode: RematchMode::SameSettings, .. }
    ));
}

#[test]
fn unknown_event_or_shape_is_rejected() {
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"room:nuke","data":{}}"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>(r#"{"data":{}}"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>(r#"["room:create"]"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>(
        r#"{"type":"draw:stroke","data":{"points":"nope"}}"#
    )
    .is_err());
}

// ════════════════════════════════════════════════════════════════════
// Server event shapes
// ════════════════════════════════════════════════════════════════════

#[test]
fn room_state_shape() {
    let value = to_value(&ServerMessage::RoomState(Box::new(sample_state())));
    assert_eq!(
        value,
        json!({
            "type": "room:state",
            "data": {
                "roomCode": "K7P2QX",
                "createdAt": 1_700_000_000_000_i64,
                "hostPlayerId": "p-ann",
                "phase": "drawing",
                "players": [{
                    "playerId": "p-ann",
                    "name": "Ann",
                    "score": 125,
                    "isHost": true,
                    "isConnected": true,
                    "isReady": false,
                    "hasGuessed": false
                }],
                "settings": {
                    "maxPlayers": 8,
                    "maxRounds": 3,
                    "roundDurationSec": 80,
                    "customWordCount": 0
                },
                "currentRound": 2,
                "drawerIndex": 0,
                "drawerOrder": ["p-ann"],
                "round": {
                    "drawerId": "p-ann",
                    "mask": "_ _ _",
                    "endsAt": 1_700_000_080_000_i64,
                    "wordSelectEndsAt": null
                }
            }
        })
    );
}

#[test]
fn room_created_wraps_state() {
    let value = to_value(&ServerMessage::RoomCreated(Box::new(RoomJoinedPayload {
        room_code: "K7P2QX".into(),
        state: sample_state(),
    })));
    assert_eq!(value["type"], "room:created");
    assert_eq!(value["data"]["roomCode"], "K7P2QX");
    assert_eq!(value["data"]["state"]["phase"], "drawing");
}

#[test]
fn sync_state_hides_absent_word_options() {
    let mut sync = SyncStatePayload {
        room_code: "K7P2QX".into(),
        phase: Phase::SelectingWord,
        current_round: 1,
        drawer_id: Some("p-ann".into()),
        mask: String::new(),
        ends_at: None,
        word_select_ends_at: Some(42),
        strokes: Vec::new(),
        word_options: None,
    };
    let value = to_value(&ServerMessage::SyncState(Box::new(sync.clone())));
    assert_eq!(value["data"]["phase"], "selecting_word");
    assert!(value["data"].get("wordOptions").is_none());

    sync.word_options = Some(vec!["moon".into(), "kite".into()]);
    let value = to_value(&ServerMessage::SyncState(Box::new(sync)));
    assert_eq!(value["data"]["wordOptions"], json!(["moon", "kite"]));
}

#[test]
fn round_events_shape() {
    assert_eq!(
        to_value(&ServerMessage::WordOptions {
            room_code: "K".into(),
            options: vec!["moon".into()],
            select_ends_at: 10,
        }),
        json!({
            "type": "round:wordOptions",
            "data": {"roomCode": "K", "options": ["moon"], "selectEndsAt": 10}
        })
    );
    assert_eq!(
        to_value(&ServerMessage::RoundStart {
            room_code: "K".into(),
            drawer_id: "p-ann".into(),
            mask: "_ _ _ _".into(),
            ends_at: 99,
        }),
        json!({
            "type": "round:start",
            "data": {"roomCode": "K", "drawerId": "p-ann", "mask": "_ _ _ _", "endsAt": 99}
        })
    );
    assert_eq!(
        to_value(&ServerMessage::RoundEnd {
            room_code: "K".into(),
            word: "moon".into(),
            reason: RoundEndReason::DrawerLeft,
        }),
        json!({
            "type": "round:end",
            "data": {"roomCode": "K", "word": "moon", "reason": "drawer_left"}
        })
    );
}

#[test]
fn replay_carries_every_stroke_in_one_event() {
    let stroke = Stroke {
        stroke_id: "s1".into(),
        drawer_id: "p-ann".into(),
        color: "#000000".into(),
        width: 4.0,
        points: vec![[0.5, 0.25]],
        created_at: 7,
    };
    assert_eq!(
        to_value(&ServerMessage::DrawReplay {
            room_code: "K".into(),
            strokes: vec![stroke],
        }),
        json!({
            "type": "draw:replay",
            "data": {
                "roomCode": "K",
                "strokes": [{
                    "strokeId": "s1",
                    "drawerId": "p-ann",
                    "color": "#000000",
                    "width": 4.0,
                    "points": [[0.5, 0.25]],
                    "createdAt": 7
                }]
            }
        })
    );
}

#[test]
fn scoring_events_shape() {
    assert_eq!(
        to_value(&ServerMessage::GuessCorrect {
            room_code: "K".into(),
            player_id: "p-ben".into(),
            name: "Ben".into(),
            points: 250,
        }),
        json!({
            "type": "guess:correct",
            "data": {"roomCode": "K", "playerId": "p-ben", "name": "Ben", "points": 250}
        })
    );
    assert_eq!(
        to_value(&ServerMessage::ScoreUpdate {
            room_code: "K".into(),
            scores: vec![ScoreEntry {
                player_id: "p-ben".into(),
                score: 250,
            }],
        }),
        json!({
            "type": "score:update",
            "data": {"roomCode": "K", "scores": [{"playerId": "p-ben", "score": 250}]}
        })
    );
    assert_eq!(
        to_value(&ServerMessage::GameEnded {
            room_code: "K".into(),
            leaderboard: vec![LeaderboardEntry {
                player_id: "p-ben".into(),
                name: "Ben".into(),
                score: 250,
            }],
        }),
        json!({
            "type": "game:ended",
            "data": {
                "roomCode": "K",
                "leaderboard": [{"playerId": "p-ben", "name": "Ben", "score": 250}]
            }
        })
    );
}

#[test]
fn rematch_started_shape() {
    assert_eq!(
        to_value(&ServerMessage::RematchStarted {
            room_code: "K".into(),
            mode: RematchMode::Fresh,
        }),
        json!({"type": "game:rematchStarted", "data": {"roomCode": "K", "mode": "fresh"}})
    );
}

#[test]
fn room_error_carries_screaming_code() {
    assert_eq!(
        to_value(&ServerMessage::RoomError {
            message: "Game already in progress".into(),
            error_code: Some(ErrorCode::InvalidRoomState),
        }),
        json!({
            "type": "room:error",
            "data": {"message": "Game already in progress", "errorCode": "INVALID_ROOM_STATE"}
        })
    );
}

// ════════════════════════════════════════════════════════════════════
// ErrorCode encoding
// ════════════════════════════════════════════════════════════════════

#[test]
fn error_codes_serialize_screaming_snake_case() {
    let cases = [
        (ErrorCode::InvalidInput, "INVALID_INPUT"),
        (ErrorCode::InvalidWord, "INVALID_WORD"),
        (ErrorCode::MessageMalformed, "MESSAGE_MALFORMED"),
        (ErrorCode::RoomNotFound, "ROOM_NOT_FOUND"),
        (ErrorCode::RoomFull, "ROOM_FULL"),
        (ErrorCode::PlayerNotFound, "PLAYER_NOT_FOUND"),
        (ErrorCode::InvalidRoomState, "INVALID_ROOM_STATE"),
        (ErrorCode::NotHost, "NOT_HOST"),
        (ErrorCode::NotDrawer, "NOT_DRAWER"),
        (ErrorCode::NotEnoughPlayers, "NOT_ENOUGH_PLAYERS"),
        (ErrorCode::PlayersNotReady, "PLAYERS_NOT_READY"),
        (ErrorCode::InternalError, "INTERNAL_ERROR"),
    ];
    for (code, wire) in cases {
        assert_eq!(serde_json::to_value(code).unwrap(), json!(wire));
        let back: ErrorCode = serde_json::from_value(json!(wire)).unwrap();
        assert_eq!(back, code);
    }
}

#[test]
fn server_event_names_match_wire_tags() {
    let events = [
        ServerMessage::GameStarted { room_code: "K".into() },
        ServerMessage::CanvasClear { room_code: "K".into() },
        ServerMessage::RoundWord {
            room_code: "K".into(),
            word: "moon".into(),
        },
        ServerMessage::RoundMask {
            room_code: "K".into(),
            mask: "m _ _ _".into(),
        },
        ServerMessage::ChatMessage {
            room_code: "K".into(),
            player_id: "p".into(),
            name: "P".into(),
            text: "hi".into(),
            ts: 1,
        },
    ];
    for event in events {
        assert_eq!(to_value(&event)["type"], event.name());
    }
}
