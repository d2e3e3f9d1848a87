//! Connection handler: one command per connection.
//!
//! The client writes a single ASCII command and either closes its write half
//! or simply waits.  The handler performs exactly one read of at most
//! [`MAX_COMMAND_LEN`] bytes, so a command split across several TCP segments
//! may arrive truncated and be rejected as malformed.  No reply is sent in any
//! case; the connection is shut down once the command has been handled.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use rumble_core::{parse_command_with, ParseError, TrailingInput, MAX_COMMAND_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time;
use tracing::{debug, info, warn};

use crate::application::context::ServerContext;
use crate::application::dispatch_rumble::{dispatch_rumble, DispatchOutcome};

/// Per-connection behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionSettings {
    /// Upper bound on the wait for the command bytes.  `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// What to do with tokens after the fourth field.
    pub trailing_input: TrailingInput,
}

/// What happened to one connection.
#[derive(Debug)]
pub enum ConnectionOutcome {
    /// The read failed or timed out; no command was parsed.
    ReadFailed(io::Error),
    /// The bytes did not form a valid command.
    Malformed(ParseError),
    /// The command was parsed and handed to the dispatcher.
    Dispatched(DispatchOutcome),
}

impl ConnectionOutcome {
    /// Whether a device was driven as a result of this connection.
    pub fn actuated(&self) -> bool {
        matches!(self, ConnectionOutcome::Dispatched(outcome) if outcome.actuated())
    }
}

/// Reads, parses and dispatches one command from `stream`, then closes it.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    ctx: &mut ServerContext,
    settings: &ConnectionSettings,
) -> ConnectionOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let outcome = process(&mut stream, peer, ctx, settings).await;

    if let Err(e) = stream.shutdown().await {
        debug!(%peer, "socket shutdown failed: {e}");
    }
    drop(stream);
    info!(%peer, "connection closed");

    outcome
}

async fn process<S>(
    stream: &mut S,
    peer: SocketAddr,
    ctx: &mut ServerContext,
    settings: &ConnectionSettings,
) -> ConnectionOutcome
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; MAX_COMMAND_LEN];
    let len = match read_once(stream, &mut buf, settings.read_timeout).await {
        Ok(len) => len,
        Err(e) => {
            warn!(%peer, "failed to read command: {e}");
            return ConnectionOutcome::ReadFailed(e);
        }
    };

    let received = &buf[..len];
    info!(
        %peer,
        bytes = len,
        "received command: {:?}",
        String::from_utf8_lossy(received).trim_end()
    );

    let command = match parse_command_with(received, settings.trailing_input) {
        Ok(command) => command,
        Err(e) => {
            warn!(%peer, "invalid command format: {e}");
            return ConnectionOutcome::Malformed(e);
        }
    };

    ConnectionOutcome::Dispatched(dispatch_rumble(ctx.registry_mut(), &command).await)
}

async fn read_once<S>(
    stream: &mut S,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> io::Result<usize>
where
    S: AsyncRead + Unpin,
{
    match timeout {
        Some(limit) => time::timeout(limit, stream.read(buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "timed out waiting for command"))?,
        None => stream.read(buf).await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
