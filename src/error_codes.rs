//! Error codes for structured error handling on the wire.
//!
//! Every rejected command produces a `RoomError` event carrying one of these
//! codes. They serialize as `SCREAMING_SNAKE_CASE` strings so that clients can
//! branch on them without parsing the human-readable message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error codes sent to the actor whose command failed.
///
/// Use [`description()`](ErrorCode::description) for a human-readable explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidInput,
    InvalidWord,
    MessageMalformed,

    // Room errors
    RoomNotFound,
    RoomFull,
    PlayerNotFound,
    InvalidRoomState,

    // Role errors
    NotHost,
    NotDrawer,

    // Game start errors
    NotEnoughPlayers,
    PlayersNotReady,

    // Server errors
    InternalError,
}

impl ErrorCode {
    /// Returns a human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            // Validation errors
            Self::InvalidInput => {
                "The provided input is invalid or malformed. Check your request parameters."
            }
            Self::InvalidWord => "The chosen word is not one of the offered options.",
            Self::MessageMalformed => "The message could not be parsed as a known command.",

            // Room errors
            Self::RoomNotFound => {
                "The requested room could not be found. It may have been closed or the code is incorrect."
            }
            Self::RoomFull => "The room has reached its maximum player capacity.",
            Self::PlayerNotFound => {
                "You are no longer a member of this room. Join it again as a new player."
            }
            Self::InvalidRoomState => "This action is not allowed in the current game phase.",

            // Role errors
            Self::NotHost => "Only the host can perform this action.",
            Self::NotDrawer => "Only the current drawer can perform this action.",

            // Game start errors
            Self::NotEnoughPlayers => "At least two players are needed to start a game.",
            Self::PlayersNotReady => "Every player must be ready before the game can start.",

            // Server errors
            Self::InternalError => {
                "An internal server error occurred. Please try again or contact support if the issue persists."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::RoomNotFound).unwrap();
        assert_eq!(json, "\"ROOM_NOT_FOUND\"");
        let json = serde_json::to_string(&ErrorCode::PlayersNotReady).unwrap();
        assert_eq!(json, "\"PLAYERS_NOT_READY\"");
    }

    #[test]
    fn display_uses_description() {
        assert_eq!(ErrorCode::NotHost.to_string(), ErrorCode::NotHost.description());
    }
}
