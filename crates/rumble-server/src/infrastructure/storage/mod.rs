//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the daemon's TOML configuration from the
//! platform config directory (or an explicit `--config` path), falls back to
//! defaults when no file exists, and converts the on-disk schema into the
//! runtime [`ServerSettings`](crate::infrastructure::network::server::ServerSettings).

pub mod config;
