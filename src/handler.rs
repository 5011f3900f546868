//! Message handler trait.
//!
//! The server core does not interpret messages; it hands each decoded
//! message to a [`Handler`] together with a write handle for the same
//! connection. Handlers run inside the owning session's task, so a slow
//! handler stalls only its own connection.

use async_trait::async_trait;
use std::net::SocketAddr;

use crate::codec::Message;
use crate::connection::Connection;

/// Error type handlers may return. Any error ends the owning session;
/// it never reaches the accept loop or other sessions.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Per-message callback invoked for every successfully decoded payload.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one decoded message. May write zero or more responses
    /// through `conn`.
    async fn handle(
        &self,
        conn: &mut Connection,
        peer: SocketAddr,
        message: Message,
    ) -> Result<(), HandlerError>;
}
