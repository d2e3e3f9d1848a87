//! Linux evdev haptic backend.
//!
//! Game controllers expose their rumble motors through the kernel
//! force-feedback interface on `/dev/input/event*`.  A device is usable when
//! it advertises `FF_RUMBLE`.  Each opened controller keeps a single uploaded
//! rumble effect, updated in place for every command:
//!
//! - `strong_magnitude` carries the low-frequency (large) motor intensity,
//! - `weak_magnitude` carries the high-frequency (small) motor intensity.
//!
//! The kernel's replay length is a `u16` in milliseconds.  Longer commands
//! upload a length of `0`, which plays until stopped; the daemon stops the
//! effect explicitly once the full duration has elapsed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use evdev::{Device, FFEffect, FFEffectCode, FFEffectData, FFEffectKind, FFReplay, FFTrigger};
use tracing::debug;

use crate::application::devices::{
    ActuationError, BackendError, DeviceCandidate, HapticBackend, HapticDevice,
};

/// Directory holding the input event nodes.
const INPUT_DIR: &str = "/dev/input";

/// Backend that enumerates `/dev/input/event*` nodes.
#[derive(Debug, Clone)]
pub struct EvdevBackend {
    input_dir: PathBuf,
}

impl Default for EvdevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EvdevBackend {
    pub fn new() -> Self {
        Self {
            input_dir: PathBuf::from(INPUT_DIR),
        }
    }

    /// Lists event nodes sorted by their kernel number (`event2` before `event10`).
    fn event_nodes(&self) -> io::Result<Vec<PathBuf>> {
        let mut nodes: Vec<PathBuf> = fs::read_dir(&self.input_dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| event_number(path).is_some())
            .collect();
        nodes.sort_by_key(|path| event_number(path));
        Ok(nodes)
    }
}

impl HapticBackend for EvdevBackend {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn discover(&self) -> Result<Vec<DeviceCandidate>, BackendError> {
        let nodes = self.event_nodes()?;
        let candidates = nodes
            .into_iter()
            .enumerate()
            .map(|(position, path)| inspect(position, &path))
            .collect();
        Ok(candidates)
    }

    fn open(&self, candidate: &DeviceCandidate) -> Result<Box<dyn HapticDevice>, ActuationError> {
        let device = Device::open(&candidate.path)?;
        if !supports_rumble(&device) {
            return Err(ActuationError::Unsupported);
        }
        Ok(Box::new(EvdevController {
            device,
            effect: None,
        }))
    }
}

/// Reads name and capabilities of one node.
///
/// A node that cannot be opened is still returned as a rumble candidate so
/// that the registry reports the real open error (usually a permission
/// problem) instead of silently ignoring the controller.
fn inspect(position: usize, path: &Path) -> DeviceCandidate {
    let display_path = path.display().to_string();
    match Device::open(path) {
        Ok(device) => DeviceCandidate {
            position,
            path: display_path,
            name: device.name().unwrap_or("Unknown").to_string(),
            supports_rumble: supports_rumble(&device),
        },
        Err(e) => {
            debug!(path = %display_path, "could not inspect input device: {e}");
            DeviceCandidate {
                position,
                path: display_path,
                name: "unreadable input device".to_string(),
                supports_rumble: true,
            }
        }
    }
}

fn supports_rumble(device: &Device) -> bool {
    device
        .supported_ff()
        .is_some_and(|effects| effects.contains(FFEffectCode::FF_RUMBLE))
}

/// Parses `N` out of `.../eventN`.
fn event_number(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("event")?
        .parse()
        .ok()
}

/// Builds the kernel effect description for one rumble.
fn rumble_effect(low: u16, high: u16, duration: Duration) -> FFEffectData {
    FFEffectData {
        direction: 0,
        trigger: FFTrigger {
            button: 0,
            interval: 0,
        },
        replay: FFReplay {
            length: replay_length_ms(duration),
            delay: 0,
        },
        kind: FFEffectKind::Rumble {
            strong_magnitude: low,
            weak_magnitude: high,
        },
    }
}

/// Replay length for the kernel; `0` means "until stopped".
fn replay_length_ms(duration: Duration) -> u16 {
    u16::try_from(duration.as_millis()).unwrap_or(0)
}

/// One opened force-feedback controller.
pub struct EvdevController {
    device: Device,
    effect: Option<FFEffect>,
}

impl HapticDevice for EvdevController {
    fn rumble(&mut self, low: u16, high: u16, duration: Duration) -> Result<(), ActuationError> {
        let data = rumble_effect(low, high, duration);

        if let Some(effect) = self.effect.as_mut() {
            effect.update(data)?;
            effect.play(1)?;
            return Ok(());
        }

        let mut effect = self.device.upload_ff_effect(data)?;
        effect.play(1)?;
        self.effect = Some(effect);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ActuationError> {
        if let Some(effect) = self.effect.as_mut() {
            effect.stop()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the effect erases it from the device.
        self.effect = None;
    }
}
