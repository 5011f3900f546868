//! Write side of an accepted connection.
//!
//! A [`Connection`] is what handlers see: the owned write half of the
//! socket. The read half stays with the session's receive loop, so a
//! handler can never starve its own reads.

use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

use crate::codec::{self, Message};

/// Handle for writing response messages back to one client.
pub struct Connection {
    writer: OwnedWriteHalf,
}

impl Connection {
    pub(crate) fn new(writer: OwnedWriteHalf) -> Self {
        Connection { writer }
    }

    /// Encode a message and write the full payload to the peer.
    ///
    /// No delimiter is appended; one send corresponds to one message on
    /// the wire.
    pub async fn send(&mut self, message: &Message) -> io::Result<()> {
        let payload = codec::encode(message)?;
        self.writer.write_all(&payload).await
    }
}
