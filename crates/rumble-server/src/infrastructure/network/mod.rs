//! Network infrastructure for the daemon.
//!
//! # Sub-modules
//!
//! - **`server`** – Owns the listening TCP socket and runs the accept loop.
//!   The accept wait is bounded so the shutdown flag is observed at least once
//!   per accept timeout, even when no client ever connects.
//!
//! - **`connection`** – Handles one accepted connection: a single read of at
//!   most `MAX_COMMAND_LEN` bytes, parse, dispatch, close.  Nothing is ever
//!   written back to the client.

pub mod connection;
pub mod server;
