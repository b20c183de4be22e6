//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! [`WebSocketTransport`] wraps one accepted WebSocket connection;
//! [`serve`] runs an accept loop that hands every connection to a
//! [`Gateway`].
//!
//! # Feature gate
//!
//! This module is only available when the `transport-websocket` feature is enabled
//! (it is enabled by default).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> std::io::Result<()> {
//! use sketch_session::config::{EngineConfig, GatewayConfig};
//! use sketch_session::transports::websocket::serve;
//! use sketch_session::Gateway;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! let gateway = Gateway::new(EngineConfig::default(), GatewayConfig::default());
//! serve(listener, gateway).await
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::gateway::Gateway;
use crate::transport::Transport;

/// Type alias for the underlying WebSocket stream.
pub type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A [`Transport`] backed by one server-side WebSocket connection.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) is cancel-safe: dropping the future before it
/// completes does not lose a frame.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

fn handshake_error(e: tokio_tungstenite::tungstenite::Error) -> TransportError {
    let kind = match &e {
        tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    TransportError::Io(std::io::Error::new(kind, e))
}

impl WebSocketTransport {
    /// Perform the server side of the WebSocket handshake on `tcp`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the handshake fails. The I/O
    /// [`ErrorKind`](std::io::ErrorKind) is preserved when there is one.
    pub async fn accept(tcp: TcpStream) -> Result<Self, TransportError> {
        let peer = tcp.peer_addr().ok();
        let stream = tokio_tungstenite::accept_async(tcp)
            .await
            .map_err(handshake_error)?;
        debug!(peer = ?peer, "WebSocket handshake completed");
        Ok(Self::from_stream(stream))
    }

    /// Like [`accept`](Self::accept), but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] with [`TimedOut`](std::io::ErrorKind::TimedOut)
    /// if the deadline elapses.
    pub async fn accept_with_timeout(
        tcp: TcpStream,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        tokio::time::timeout(timeout, Self::accept(tcp))
            .await
            .map_err(|_| {
                TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "WebSocket handshake timed out",
                ))
            })?
    }

    /// Wrap an already-upgraded WebSocket stream.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Some(Err(TransportError::Receive(e.to_string()))),
                None => return None,
            };

            match msg {
                Message::Text(text) => return Some(Ok(text.to_string())),
                Message::Close(frame) => {
                    debug!(?frame, "received WebSocket close frame");
                    return None;
                }
                // tungstenite queues the pong itself.
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Binary(_) => {
                    warn!("received unexpected binary WebSocket frame, skipping");
                }
                Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// Accept WebSocket connections forever, running each through `gateway` on
/// its own task.
///
/// # Errors
///
/// Returns the listener's error if accepting a TCP connection fails.
pub async fn serve(listener: TcpListener, gateway: Gateway) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening for WebSocket connections");
    }
    loop {
        let (tcp, peer) = listener.accept().await?;
        let gateway = gateway.clone();
        tokio::spawn(async move {
            match WebSocketTransport::accept(tcp).await {
                Ok(transport) => gateway.serve_connection(transport).await,
                Err(e) => debug!(%peer, error = %e, "WebSocket handshake failed"),
            }
        });
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn websocket_transport_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WebSocketTransport>();
    }

    /// Accept one connection with [`WebSocketTransport::accept`] and hand the
    /// transport to `handler`. Returns the URL to connect to.
    async fn start_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(WebSocketTransport) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let transport = WebSocketTransport::accept(tcp).await.unwrap();
            handler(transport).await;
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn recv_receives_text_and_skips_binary() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let url = start_server(|mut transport| async move {
            let first = transport.recv().await.unwrap().unwrap();
            let _ = done_tx.send(first);
        })
        .await;

        let (mut client, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        client.send(Message::Binary(vec![1, 2].into())).await.unwrap();
        client.send(Message::Text("hello".into())).await.unwrap();

        assert_eq!(done_rx.await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn recv_returns_none_on_close_frame() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let url = start_server(|mut transport| async move {
            let _ = done_tx.send(transport.recv().await.is_none());
        })
        .await;

        let (mut client, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        client.close(None).await.unwrap();

        assert!(done_rx.await.unwrap());
    }

    #[tokio::test]
    async fn send_reaches_client() {
        let url = start_server(|mut transport| async move {
            transport.send("welcome".to_string()).await.unwrap();
            transport.close().await.unwrap();
        })
        .await;

        let (mut client, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        match client.next().await {
            Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "welcome"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_after_close_returns_closed_and_close_is_idempotent() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let url = start_server(|mut transport| async move {
            transport.close().await.unwrap();
            transport.close().await.unwrap();
            let err = transport.send("late".into()).await.unwrap_err();
            let _ = done_tx.send(matches!(err, TransportError::Closed));
        })
        .await;

        let (_client, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        assert!(done_rx.await.unwrap());
    }

    #[tokio::test]
    async fn accept_rejects_plain_tcp_garbage() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            WebSocketTransport::accept(tcp).await
        });

        let mut raw = TcpStream::connect(addr).await.unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut raw, b"not a websocket\r\n\r\n")
            .await
            .unwrap();

        let result = server.await.unwrap();
        assert!(matches!(result, Err(TransportError::Io(_))));
    }
}
