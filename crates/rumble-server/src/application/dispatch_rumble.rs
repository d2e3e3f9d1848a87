//! Rumble dispatch: validates a parsed command and drives the device.
//!
//! The wait between starting and stopping the rumble is a plain sleep on the
//! server's only thread.  Nothing else runs until it finishes, which is what
//! guarantees that two commands never actuate at the same time.

use rumble_core::{DeviceIndex, IndexError, RumbleCommand};
use tokio::time;
use tracing::{error, info, warn};

use crate::application::devices::{ActuationError, DeviceRegistry};

/// Result of dispatching one command.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The rumble ran for its full duration and a stop was issued.
    Completed { index: DeviceIndex },
    /// The index did not name an open device; nothing was actuated.
    InvalidIndex(IndexError),
    /// The device refused to start; no wait and no stop followed.
    ActuationFailed {
        index: DeviceIndex,
        error: ActuationError,
    },
}

impl DispatchOutcome {
    /// Whether the device was actually driven.
    pub fn actuated(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { .. })
    }
}

/// Runs `command` against `registry`: validate, actuate, wait, stop.
///
/// The stop is sent even if the device would stop on its own, so the motors
/// are always left at rest.  A failed stop is logged but does not change the
/// outcome.
pub async fn dispatch_rumble(
    registry: &mut DeviceRegistry,
    command: &RumbleCommand,
) -> DispatchOutcome {
    let index = match DeviceIndex::validate(command.device_index, registry.count()) {
        Ok(index) => index,
        Err(e) => {
            warn!("invalid controller index: {e}");
            return DispatchOutcome::InvalidIndex(e);
        }
    };

    if let Err(error) = registry.actuate(
        index,
        command.low_intensity,
        command.high_intensity,
        command.duration_ms,
    ) {
        error!(device = %index, "unable to start rumble: {error}");
        return DispatchOutcome::ActuationFailed { index, error };
    }

    info!(
        device = %index,
        controller = registry.name(index).unwrap_or("unknown"),
        low_freq = command.low_intensity,
        high_freq = command.high_intensity,
        duration_ms = command.duration_ms,
        "rumble started"
    );

    time::sleep(command.duration()).await;

    match registry.stop(index) {
        Ok(()) => info!(device = %index, "rumble stopped"),
        Err(e) => warn!(device = %index, "failed to stop rumble: {e}"),
    }

    DispatchOutcome::Completed { index }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
