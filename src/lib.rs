//! # Sketch Session
//!
//! Room and session engine for a real-time drawing-and-guessing party game.
//!
//! Players gather in a room identified by a short code, take turns drawing a
//! secret word while the others guess it in chat, and score points under time
//! pressure. This crate owns the room state machine and its timers; rendering
//! and HTTP bootstrapping live elsewhere.
//!
//! ## Layout
//!
//! - [`engine::GameEngine`]: phase transitions, timers, scoring, membership
//! - [`gateway::Gateway`]: validates inbound commands and drives connections
//! - [`hub::Hub`]: per-connection outbound channels and room fan-out
//! - [`registry::SessionRegistry`]: room code → session store
//! - [`protocol`]: the JSON wire format
//! - [`transports`]: a WebSocket [`Transport`] (feature `transport-websocket`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "transport-websocket")]
//! # async fn run() -> std::io::Result<()> {
//! use sketch_session::config::{EngineConfig, GatewayConfig};
//! use sketch_session::Gateway;
//!
//! let gateway = Gateway::new(EngineConfig::default(), GatewayConfig::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
//! sketch_session::transports::serve(listener, gateway).await
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod error_codes;
pub mod gateway;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod room_code;
pub mod rules;
pub mod session;
pub mod transport;
pub mod transports;
pub mod words;

// Re-export primary types for ergonomic imports.
pub use config::{EngineConfig, GatewayConfig};
pub use engine::{ChatOutcome, GameEngine, NewStroke};
pub use error::{ErrorKind, GameError, TransportError};
pub use error_codes::ErrorCode;
pub use gateway::Gateway;
pub use hub::Hub;
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::SessionRegistry;
pub use session::{Phase, Settings, SettingsPatch};
pub use transport::{ConnectionId, EventSink, Transport};
pub use words::{FixedWordSupply, TieredWordSupply, WordSupply};

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
