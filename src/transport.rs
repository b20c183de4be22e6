//! Transport abstractions.
//!
//! Two seams separate the engine from the network:
//!
//! - [`Transport`] is one player connection: a bidirectional channel of JSON
//!   text frames. The gateway drives one per connected player.
//! - [`EventSink`] is the engine's only way out: "send event E to connection
//!   A" and "send event E to everyone in room R". The [`Hub`](crate::hub::Hub)
//!   implements it on top of per-connection channels; tests record into a
//!   vector instead.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use sketch_session::error::TransportError;
//! use sketch_session::transport::Transport;
//! use tokio::sync::mpsc;
//!
//! struct ChannelTransport {
//!     inbound: mpsc::Receiver<String>,
//!     outbound: mpsc::Sender<String>,
//! }
//!
//! #[async_trait]
//! impl Transport for ChannelTransport {
//!     async fn send(&mut self, message: String) -> Result<(), TransportError> {
//!         self.outbound
//!             .send(message)
//!             .await
//!             .map_err(|_| TransportError::Closed)
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, TransportError>> {
//!         self.inbound.recv().await.map(Ok)
//!     }
//!
//!     async fn close(&mut self) -> Result<(), TransportError> {
//!         self.inbound.close();
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TransportError;
use crate::protocol::ServerMessage;

/// Opaque handle of one live connection. A player's handle changes every
/// time they reconnect.
pub type ConnectionId = Uuid;

/// A bidirectional text message transport for one player connection.
///
/// Each call to [`send`](Transport::send) transmits one complete JSON message.
/// Each call to [`recv`](Transport::recv) returns one complete JSON message.
///
/// # Object Safety
///
/// This trait is object-safe, so `Box<dyn Transport>` works for dynamic dispatch.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe because the gateway polls
/// it inside `tokio::select!`.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the player.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Send`] if the message could not be sent, or
    /// [`TransportError::Closed`] after [`close`](Transport::close).
    async fn send(&mut self, message: String) -> Result<(), TransportError>;

    /// Receive the next JSON text message from the player.
    ///
    /// Returns `None` once the peer closed the connection cleanly.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection gracefully. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Outbound fan-out used by the engine.
///
/// All methods are synchronous and must never block: the engine calls them
/// while holding a room's lock.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver `message` to a single connection.
    fn send_to(&self, connection: ConnectionId, message: ServerMessage);

    /// Deliver `message` to every connection subscribed to `room_code`.
    fn broadcast(&self, room_code: &str, message: ServerMessage);

    /// Subscribe `connection` to the room's broadcasts.
    fn join_room(&self, connection: ConnectionId, room_code: &str);

    /// Unsubscribe `connection` from the room's broadcasts.
    fn leave_room(&self, connection: ConnectionId, room_code: &str);
}
