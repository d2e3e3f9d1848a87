//! rumble-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does rumbled do?
//!
//! The daemon opens every rumble-capable game controller attached to the
//! machine, then listens on a TCP port.  Each connection carries exactly one
//! text command (`<device> <low> <high> <durationMs>`).  The daemon:
//!
//! 1. Accepts the connection and reads at most 255 bytes.
//! 2. Parses the command with `rumble_core::parse_command`.
//! 3. Checks the device index against the devices it opened at startup.
//! 4. Starts the rumble, waits out the duration, then forces the motors off.
//! 5. Closes the connection without sending anything back.
//!
//! Connections are handled one at a time on a single thread; while a rumble
//! is running no new connection is accepted.

/// Application layer: the device registry, rumble dispatch and server context.
pub mod application;

/// Infrastructure layer: sockets, device backends, signals and configuration.
pub mod infrastructure;
