//! dispatchd: a minimal JSON-over-TCP dispatch server
//!
//! Accepts TCP connections and runs one receive loop per client. Each
//! read from a client is decoded as a single JSON message and handed to
//! a handler, which may write JSON responses back on the same
//! connection.
//!
//! Features:
//! - One task per accepted connection, fully isolated sessions
//! - Schema-free JSON messages ({"cmd": ..., "data": ...} by convention)
//! - Per-connection idle timeout
//! - Configuration via CLI arguments or TOML file
//!
//! The wire format carries no delimiter or length prefix: one write on
//! the client must arrive as one read here, or decoding fails and the
//! connection is closed.

mod codec;
mod config;
mod connection;
mod handler;
mod server;
mod session;

use async_trait::async_trait;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codec::Message;
use config::Config;
use connection::Connection;
use handler::{Handler, HandlerError};
use server::Server;

/// Sample handler: mirrors `cmd` and `data` back to the sender.
///
/// A message without both keys is a handler error, which closes the
/// session.
struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(
        &self,
        conn: &mut Connection,
        _peer: SocketAddr,
        message: Message,
    ) -> Result<(), HandlerError> {
        let reply = json!({
            "cmd": message.get("cmd").ok_or("message missing 'cmd'")?,
            "data": message.get("data").ok_or("message missing 'data'")?,
        });
        conn.send(&reply).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // Initialize logging; --debug raises the filter unless RUST_LOG is
    // set explicitly.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&config.log_level)
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        timeout_secs = config.timeout,
        "Starting dispatchd server"
    );

    let server = Server::new(config, Arc::new(EchoHandler));
    server.run().await
}
