//! Error types for the session engine.

use thiserror::Error;

use crate::error_codes::ErrorCode;
use crate::session::Phase;

/// Errors returned by engine operations and the gateway.
///
/// Every variant is recoverable: a failed command leaves the room untouched
/// and is reported only to the actor that issued it.
#[derive(Debug, Error)]
pub enum GameError {
    /// No room is registered under the given code.
    #[error("Room not found")]
    RoomNotFound,

    /// The player is not (or no longer) a member of the room.
    #[error("Player not found in room")]
    PlayerNotFound,

    /// The action requires the host.
    #[error("Only host can perform this action")]
    NotHost,

    /// The action requires the current drawer.
    #[error("Only drawer can do this action")]
    NotDrawer,

    /// The action is not valid in the room's current phase.
    #[error("Not allowed during {actual} (requires {expected})")]
    InvalidPhase {
        /// Phase the operation requires.
        expected: Phase,
        /// Phase the room was actually in.
        actual: Phase,
    },

    /// The selected word is empty or was not offered.
    #[error("Selected word is not in options")]
    InvalidWord,

    /// A command was missing a required field or carried a malformed value.
    #[error("Invalid payload: {0}")]
    InvalidInput(String),

    /// The room is at capacity and the joining player is new.
    #[error("Room is full")]
    RoomFull,

    /// Fewer than two players are present.
    #[error("Need at least 2 players to start")]
    NotEnoughPlayers,

    /// Some non-host player has not readied up.
    #[error("All players must be ready")]
    PlayersNotReady,

    /// `end_round` was called while no word is in play.
    #[error("No active word")]
    NoActiveWord,

    /// The drawer order is empty when a round needs a drawer.
    #[error("No drawer available")]
    NoDrawer,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`GameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Room or player absent.
    NotFound,
    /// Not host / not drawer.
    Forbidden,
    /// Operation not valid in the current phase.
    InvalidPhase,
    /// Malformed word, settings or payload.
    InvalidInput,
    /// Room full or too few players to start.
    CapacityExceeded,
    /// Engine invariant broken; never caused by the actor.
    Internal,
}

impl GameError {
    /// Convenience constructor for phase guard failures.
    pub fn invalid_phase(expected: Phase, actual: Phase) -> Self {
        Self::InvalidPhase { expected, actual }
    }

    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound | Self::PlayerNotFound => ErrorKind::NotFound,
            Self::NotHost | Self::NotDrawer => ErrorKind::Forbidden,
            Self::InvalidPhase { .. } | Self::NoActiveWord => ErrorKind::InvalidPhase,
            Self::InvalidWord | Self::InvalidInput(_) | Self::Serialization(_) => {
                ErrorKind::InvalidInput
            }
            Self::RoomFull | Self::NotEnoughPlayers | Self::PlayersNotReady => {
                ErrorKind::CapacityExceeded
            }
            Self::NoDrawer => ErrorKind::Internal,
        }
    }

    /// Returns the wire code sent alongside the message.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound => ErrorCode::RoomNotFound,
            Self::PlayerNotFound => ErrorCode::PlayerNotFound,
            Self::NotHost => ErrorCode::NotHost,
            Self::NotDrawer => ErrorCode::NotDrawer,
            Self::InvalidPhase { .. } | Self::NoActiveWord => ErrorCode::InvalidRoomState,
            Self::InvalidWord => ErrorCode::InvalidWord,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Serialization(_) => ErrorCode::MessageMalformed,
            Self::RoomFull => ErrorCode::RoomFull,
            Self::NotEnoughPlayers => ErrorCode::NotEnoughPlayers,
            Self::PlayersNotReady => ErrorCode::PlayersNotReady,
            Self::NoDrawer => ErrorCode::InternalError,
        }
    }
}

/// A specialized [`Result`] type for engine operations.
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport failed to send a message.
    #[error("transport send error: {0}")]
    Send(String),

    /// The transport failed to receive a message.
    #[error("transport receive error: {0}")]
    Receive(String),

    /// The transport was already closed.
    #[error("transport closed")]
    Closed,

    /// An I/O error occurred during connection setup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
