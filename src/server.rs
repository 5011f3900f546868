//! TCP accept loop.
//!
//! Binds the listening socket and spawns a [`ClientSession`] for every
//! accepted connection. The accept loop never blocks on a client: a
//! session starts its own task and the loop goes straight back to
//! accepting.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::handler::Handler;
use crate::session::ClientSession;

/// Listen backlog
const LISTEN_BACKLOG: i32 = 5;

/// Server instance
pub struct Server {
    config: Config,
    handler: Arc<dyn Handler>,
}

impl Server {
    /// Create a new server instance. Pure configuration; no socket is
    /// touched until [`Server::run`].
    pub fn new(config: Config, handler: Arc<dyn Handler>) -> Self {
        Server { config, handler }
    }

    /// Bind the listening socket and accept connections until the
    /// process dies or an accept error stops the loop. There is no
    /// graceful shutdown path.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = self.bind()?;
        info!(address = %listener.local_addr()?, "Server listening");
        self.serve(listener).await?;
        Ok(())
    }

    /// Create the listener with address reuse and a fixed backlog.
    fn bind(&self) -> io::Result<TcpListener> {
        let addr = self.config.listen_addr()?;

        let socket = socket2::Socket::new(
            match addr {
                SocketAddr::V4(_) => socket2::Domain::IPV4,
                SocketAddr::V6(_) => socket2::Domain::IPV6,
            },
            socket2::Type::STREAM,
            Some(socket2::Protocol::TCP),
        )?;

        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;

        debug!(address = %addr, "Socket bound");
        TcpListener::from_std(socket.into())
    }

    async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection, stopping listener");
                    return Err(e);
                }
            };

            debug!(peer = %peer, "Client connected");

            ClientSession::new(
                stream,
                peer,
                self.config.idle_timeout(),
                Arc::clone(&self.handler),
            )
            .start();
        }
    }
}
