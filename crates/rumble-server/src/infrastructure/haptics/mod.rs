//! Haptic backend implementations.
//!
//! The backend is chosen at startup from configuration.  `evdev` only exists
//! on Linux; asking for it elsewhere is a startup error.

use serde::{Deserialize, Serialize};

use crate::application::devices::{BackendError, HapticBackend};

pub mod mock;

#[cfg(target_os = "linux")]
pub mod evdev;

/// Which backend supplies the devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Linux force-feedback devices under `/dev/input`.
    #[default]
    Evdev,
    /// Simulated controllers that only log what they would do.
    Mock,
}

/// Creates the backend selected by `kind`.
///
/// `mock_count` is the number of simulated controllers for [`BackendKind::Mock`].
///
/// # Errors
///
/// Returns [`BackendError::Unsupported`] when the evdev backend is requested on
/// a platform without evdev.
pub fn build_backend(
    kind: BackendKind,
    mock_count: usize,
) -> Result<Box<dyn HapticBackend>, BackendError> {
    match kind {
        BackendKind::Mock => Ok(Box::new(mock::MockHapticBackend::new(mock_count))),
        #[cfg(target_os = "linux")]
        BackendKind::Evdev => Ok(Box::new(evdev::EvdevBackend::new())),
        #[cfg(not(target_os = "linux"))]
        BackendKind::Evdev => Err(BackendError::Unsupported { backend: "evdev" }),
    }
}
