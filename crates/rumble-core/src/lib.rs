//! # rumble-core
//!
//! Shared library for rumbled containing the text command grammar and the
//! device-index rules of the haptic control protocol.
//!
//! This crate has zero dependencies on OS APIs, device libraries, or network
//! sockets, so everything in it is a pure function of its inputs.
//!
//! # Protocol overview
//!
//! A client opens a TCP connection to the daemon, writes one line of ASCII
//! text and closes (or simply stops writing):
//!
//! ```text
//! <deviceIndex> <lowIntensity> <highIntensity> <durationMs>
//! 0 30000 30000 500
//! ```
//!
//! The daemon never answers.  Success is observable only through the
//! controller vibrating and through the daemon's own logs.
//!
//! - **`protocol`** – Turns the raw bytes read from a connection into a typed
//!   [`RumbleCommand`], or a [`ParseError`] explaining what was wrong.
//!
//! - **`domain`** – Validates a parsed device index against the number of
//!   devices the daemon actually opened.

pub mod domain;
pub mod protocol;

pub use domain::device_index::{DeviceIndex, IndexError};
pub use protocol::command::{
    parse_command, parse_command_with, CommandField, ParseError, RumbleCommand, TrailingInput,
    DEFAULT_PORT, MAX_COMMAND_LEN,
};
