//! Application layer for the daemon.
//!
//! - **`devices`** – The [`devices::DeviceRegistry`] that owns every opened
//!   controller, plus the `HapticBackend` / `HapticDevice` traits that the
//!   infrastructure layer implements (evdev on Linux, an in-memory mock for
//!   tests and dry runs).
//!
//! - **`dispatch_rumble`** – Validates a parsed command against the registry,
//!   runs the rumble for its duration and stops the motors afterwards.
//!
//! - **`context`** – [`context::ServerContext`], the explicit state handed to
//!   the server loop: the registry and the shutdown flag.

pub mod context;
pub mod devices;
pub mod dispatch_rumble;
