//! # Sketch Session Server
//!
//! Runs the session engine behind a WebSocket listener.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example serve
//!
//! # Override the bind address and log level:
//! SKETCH_ADDR=0.0.0.0:8080 RUST_LOG=debug cargo run --example serve
//! ```

use sketch_session::config::{EngineConfig, GatewayConfig};
use sketch_session::transports::websocket::serve;
use sketch_session::Gateway;

/// Default bind address when `SKETCH_ADDR` is not set.
const DEFAULT_ADDR: &str = "127.0.0.1:3001";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let addr = std::env::var("SKETCH_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let gateway = Gateway::new(EngineConfig::default(), GatewayConfig::default());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // ── Serve ───────────────────────────────────────────────────────
    tokio::select! {
        result = serve(listener, gateway) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down");
        }
    }
    Ok(())
}
