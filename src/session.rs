//! Per-connection receive loop.
//!
//! Each accepted connection gets one [`ClientSession`] running in its
//! own task. The session owns the socket exclusively: the read half
//! drives the loop, the write half is lent to the handler for
//! responses. Sessions share no state, so one client failing, stalling,
//! or flooding never affects another.

use bytes::BytesMut;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::codec::{self, DecodeError};
use crate::connection::Connection;
use crate::handler::{Handler, HandlerError};

/// Receive buffer size. Each read pulls at most this many bytes and is
/// decoded as one message.
const RECV_BUFFER: usize = 1024;

/// Why a receive loop ended. All variants close the connection the same
/// way; keeping them distinct makes the close reason auditable in logs.
enum SessionEnd {
    /// Peer closed its write side (zero-byte read).
    Disconnect,
    /// No data arrived within the idle timeout.
    Timeout,
    /// Read failed at the socket layer.
    Io(io::Error),
    /// A payload arrived that did not decode.
    Malformed(DecodeError),
    /// The handler returned an error for a decoded message.
    Handler(HandlerError),
}

/// One live client connection and its receive loop.
pub struct ClientSession {
    reader: OwnedReadHalf,
    conn: Connection,
    peer: SocketAddr,
    idle_timeout: Duration,
    handler: Arc<dyn Handler>,
}

impl ClientSession {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        idle_timeout: Duration,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        ClientSession {
            reader,
            conn: Connection::new(writer),
            peer,
            idle_timeout,
            handler,
        }
    }

    /// Spawn the receive loop as an independent task. Returns
    /// immediately; the handle resolves when the session ends.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let end = self.receive_loop().await;

        match end {
            SessionEnd::Disconnect => debug!(peer = %self.peer, "client disconnected"),
            SessionEnd::Timeout => {
                debug!(peer = %self.peer, timeout_secs = self.idle_timeout.as_secs(), "idle timeout expired")
            }
            SessionEnd::Io(e) => debug!(peer = %self.peer, error = %e, "read failed"),
            SessionEnd::Malformed(e) => {
                warn!(peer = %self.peer, error = %e, "closing on undecodable payload")
            }
            SessionEnd::Handler(e) => warn!(peer = %self.peer, error = %e, "handler failed"),
        }
        // Dropping the session drops both socket halves, closing the
        // connection on every exit path.
    }

    async fn receive_loop(&mut self) -> SessionEnd {
        let mut buf = BytesMut::with_capacity(RECV_BUFFER);

        loop {
            buf.clear();

            let n = match tokio::time::timeout(self.idle_timeout, self.reader.read_buf(&mut buf))
                .await
            {
                Err(_) => return SessionEnd::Timeout,
                Ok(Err(e)) => return SessionEnd::Io(e),
                Ok(Ok(0)) => return SessionEnd::Disconnect,
                Ok(Ok(n)) => n,
            };

            // One read, one message. Nothing is carried over to the
            // next iteration.
            let message = match codec::decode(&buf[..n]) {
                Ok(message) => message,
                Err(e) => return SessionEnd::Malformed(e),
            };

            debug!(peer = %self.peer, payload = %message, "message received");

            if let Err(e) = self.handler.handle(&mut self.conn, self.peer, message).await {
                return SessionEnd::Handler(e);
            }
        }
    }
}
