//! Infrastructure layer for the daemon.
//!
//! Contains OS-facing adapters: the TCP command server, haptic device
//! backends, signal handling and configuration persistence.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rumble_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`haptics`** – Implementations of `HapticBackend`.  On Linux the evdev
//!   backend uploads `FF_RUMBLE` force-feedback effects; the mock backend
//!   records every call in memory and is used by tests and `--backend mock`.
//!
//! - **`network`** – The listening socket, the accept loop and the
//!   one-command-per-connection handler.
//!
//! - **`signal`** – Turns Ctrl-C / SIGTERM into a shutdown request.
//!
//! - **`storage`** – TOML configuration file loading and saving.

pub mod haptics;
pub mod network;
pub mod signal;
pub mod storage;
