//! Command server: the listening socket and the accept loop.
//!
//! # Lifecycle
//!
//! ```text
//! Binding ──► Listening ──► Waiting ◄──► Accepting
//!                              │
//!                   shutdown   ▼
//!                           Draining ──► Closed
//! ```
//!
//! Connections are handled one at a time, on the loop's own task.  While a
//! rumble is in progress nothing else is accepted; further clients queue in
//! the kernel backlog.  The accept wait is bounded by
//! [`ServerSettings::accept_timeout`] so a shutdown request is noticed even
//! when nobody connects.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use rumble_core::DEFAULT_PORT;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::time::{self, timeout};
use tracing::{debug, info, warn};

use crate::application::context::ServerContext;
use crate::infrastructure::network::connection::{handle_connection, ConnectionSettings};

/// Listen backlog used when nothing else is configured.
pub const DEFAULT_BACKLOG: u32 = 5;

/// Default upper bound on a single accept wait.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after a failed accept so a persistent error (e.g. `EMFILE`) does not
/// spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Error type for setting up the listening socket.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),
    #[error("failed to set SO_REUSEADDR: {0}")]
    SocketOption(#[source] io::Error),
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("listen failed: {0}")]
    Listen(#[source] io::Error),
}

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Binding,
    Listening,
    Waiting,
    Accepting,
    Draining,
    Closed,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_address: IpAddr,
    pub port: u16,
    pub backlog: u32,
    pub accept_timeout: Duration,
    pub connection: ConnectionSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            connection: ConnectionSettings::default(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// A bound, listening command server.
pub struct CommandServer {
    listener: TcpListener,
    settings: ServerSettings,
    state: ServerState,
    local_addr: SocketAddr,
}

impl CommandServer {
    /// Creates the socket, enables address reuse, binds and listens.
    ///
    /// # Errors
    ///
    /// Each of the four steps has its own [`ServerError`] variant.
    pub fn bind(settings: &ServerSettings) -> Result<Self, ServerError> {
        let addr = settings.socket_addr();
        debug!(state = ?ServerState::Binding, %addr, "creating listening socket");

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(ServerError::Socket)?;
        socket.set_reuseaddr(true).map_err(ServerError::SocketOption)?;
        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let listener = socket.listen(settings.backlog).map_err(ServerError::Listen)?;

        // Port 0 asks the OS for a free port; report the one we actually got.
        let local_addr = listener.local_addr().unwrap_or(addr);
        info!(%local_addr, backlog = settings.backlog, "listening for rumble commands");

        Ok(Self {
            listener,
            settings: settings.clone(),
            state: ServerState::Listening,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    fn transition(&mut self, next: ServerState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "server state change");
            self.state = next;
        }
    }

    /// Serves connections until the context's shutdown flag is set.
    ///
    /// Consumes the server; the listener is released before returning
    /// [`ServerState::Closed`].
    pub async fn run(mut self, ctx: &mut ServerContext) -> ServerState {
        let connection = self.settings.connection;
        let accept_timeout = self.settings.accept_timeout;
        let backoff = accept_error_backoff(accept_timeout);

        while !ctx.shutdown().is_requested() {
            self.transition(ServerState::Waiting);

            let (stream, peer) = match timeout(accept_timeout, self.listener.accept()).await {
                Err(_) => continue,
                Ok(Err(e)) => {
                    if !ctx.shutdown().is_requested() {
                        warn!("accept error: {e}");
                    }
                    time::sleep(backoff).await;
                    continue;
                }
                Ok(Ok(pair)) => pair,
            };

            self.transition(ServerState::Accepting);
            info!(%peer, "accepted connection");
            handle_connection(stream, peer, ctx, &connection).await;
        }

        info!("shutdown requested; closing listener");
        self.transition(ServerState::Draining);
        let CommandServer { listener, .. } = self;
        drop(listener);
        debug!(to = ?ServerState::Closed, "server state change");
        ServerState::Closed
    }
}

/// Never waits longer than one accept timeout, so shutdown stays as responsive
/// as on the idle path.
fn accept_error_backoff(accept_timeout: Duration) -> Duration {
    ACCEPT_ERROR_BACKOFF.min(accept_timeout)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
