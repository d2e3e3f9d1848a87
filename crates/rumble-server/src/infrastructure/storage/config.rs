//! TOML-based configuration for the daemon.
//!
//! Default location:
//! - Linux:    `$XDG_CONFIG_HOME/rumbled/config.toml` or `~/.config/rumbled/config.toml`
//! - macOS:    `~/Library/Application Support/rumbled/config.toml`
//! - Windows:  `%APPDATA%\rumbled\config.toml`
//!
//! Every field has a default, so an absent file, an empty file and a file
//! that only sets one key are all valid:
//!
//! ```toml
//! [daemon]
//! log_level = "info"
//!
//! [server]
//! bind_address = "0.0.0.0"
//! port = 57920
//! backlog = 5
//! accept_timeout_ms = 1000
//! read_timeout_ms = 0          # 0 waits indefinitely for the command bytes
//! trailing_input = "ignore"    # or "reject"
//!
//! [devices]
//! backend = "evdev"            # or "mock"
//! mock_count = 2
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rumble_core::{TrailingInput, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::haptics::BackendKind;
use crate::infrastructure::network::connection::ConnectionSettings;
use crate::infrastructure::network::server::{ServerSettings, DEFAULT_BACKLOG};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `bind_address` is not an IP address.
    #[error("invalid bind address {value:?}: {source}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A value parsed but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"rumble_server=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Listening socket and per-connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind.  `"0.0.0.0"` binds all IPv4 interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pending-connection queue length passed to `listen`.
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    /// Upper bound on one accept wait; also the shutdown reaction time when idle.
    #[serde(default = "default_accept_timeout_ms")]
    pub accept_timeout_ms: u64,
    /// Upper bound on the wait for command bytes.  `0` disables the limit.
    #[serde(default)]
    pub read_timeout_ms: u64,
    #[serde(default)]
    pub trailing_input: TrailingInputPolicy,
}

/// On-disk spelling of [`TrailingInput`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrailingInputPolicy {
    #[default]
    Ignore,
    Reject,
}

impl From<TrailingInputPolicy> for TrailingInput {
    fn from(policy: TrailingInputPolicy) -> Self {
        match policy {
            TrailingInputPolicy::Ignore => TrailingInput::Ignore,
            TrailingInputPolicy::Reject => TrailingInput::Reject,
        }
    }
}

/// Device backend selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DevicesConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Number of simulated controllers when `backend = "mock"`.
    #[serde(default = "default_mock_count")]
    pub mock_count: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_backlog() -> u32 {
    DEFAULT_BACKLOG
}
fn default_accept_timeout_ms() -> u64 {
    1000
}
fn default_mock_count() -> usize {
    2
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            backlog: default_backlog(),
            accept_timeout_ms: default_accept_timeout_ms(),
            read_timeout_ms: 0,
            trailing_input: TrailingInputPolicy::default(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            mock_count: default_mock_count(),
        }
    }
}

impl ServerConfig {
    /// Converts the on-disk schema into runtime listener settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if `bind_address` is not an
    /// IP address and [`ConfigError::Invalid`] for a zero accept timeout or
    /// backlog.
    pub fn to_settings(&self) -> Result<ServerSettings, ConfigError> {
        let bind_address: IpAddr =
            self.bind_address
                .parse()
                .map_err(|source| ConfigError::InvalidBindAddress {
                    value: self.bind_address.clone(),
                    source,
                })?;
        if self.accept_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "server.accept_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.backlog == 0 {
            return Err(ConfigError::Invalid(
                "server.backlog must be greater than zero".to_string(),
            ));
        }

        let read_timeout =
            (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms));

        Ok(ServerSettings {
            bind_address,
            port: self.port,
            backlog: self.backlog,
            accept_timeout: Duration::from_millis(self.accept_timeout_ms),
            connection: ConnectionSettings {
                read_timeout,
                trailing_input: self.trailing_input.into(),
            },
        })
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the default location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the default config file, using `AppConfig::default()` when the
/// platform has no config directory at all (`HOME` and `XDG_CONFIG_HOME`
/// unset, as under a bare service manager).
///
/// The tolerated [`ConfigError::NoPlatformConfigDir`] is handed back so the
/// caller can log it once logging is up.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config_or_default() -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
    tolerate_missing_config_dir(load_config())
}

fn tolerate_missing_config_dir(
    result: Result<AppConfig, ConfigError>,
) -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
    match result {
        Ok(config) => Ok((config, None)),
        Err(e @ ConfigError::NoPlatformConfigDir) => Ok((AppConfig::default(), Some(e))),
        Err(e) => Err(e),
    }
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `rumbled` component.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("rumbled"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rumbled"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("rumbled")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
