//! DeviceRegistry: owns every opened haptic device for the life of the process.
//!
//! Device discovery and the actuation primitive live behind two traits so that
//! the registry, and everything above it, can run without hardware:
//!
//! - [`HapticBackend`] enumerates candidate devices and opens them.
//! - [`HapticDevice`] is one opened controller that can rumble and stop.
//!
//! Platform implementations are in `infrastructure::haptics`.

use std::time::Duration;

use rumble_core::DeviceIndex;
use thiserror::Error;
use tracing::{error, info, warn};

/// Error type for a single device operation.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device does not support rumble effects")]
    Unsupported,
    #[error("no device at index {0}")]
    NoSuchDevice(DeviceIndex),
    #[error("platform error: {0}")]
    Platform(String),
}

/// Error type for backend initialisation and enumeration.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("the {backend} backend is not available on this platform")]
    Unsupported { backend: &'static str },
    #[error("failed to enumerate input devices: {0}")]
    Enumeration(#[from] std::io::Error),
}

/// Error type for building the registry at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("haptic backend initialisation failed: {0}")]
    Backend(#[from] BackendError),
    #[error("no input devices connected")]
    NoDevicesPresent,
    #[error("no rumble-capable controller could be opened")]
    NoDevicesOpened,
}

/// One opened controller.
///
/// Implementations are driven from a single thread, one command at a time.
#[cfg_attr(test, mockall::automock)]
pub trait HapticDevice: Send {
    /// Starts both motors at the given magnitudes for `duration`.
    fn rumble(&mut self, low: u16, high: u16, duration: Duration) -> Result<(), ActuationError>;

    /// Forces both motors to rest.
    fn stop(&mut self) -> Result<(), ActuationError>;

    /// Releases any resources held on the device (uploaded effects etc).
    fn close(&mut self) {}
}

/// A device found during enumeration, not yet opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    /// Position in the backend's enumeration order.
    pub position: usize,
    /// Backend-specific location, e.g. `/dev/input/event7`.
    pub path: String,
    /// Product name reported by the device.
    pub name: String,
    /// Whether the device advertises dual-motor rumble support.
    pub supports_rumble: bool,
}

/// Discovers and opens haptic devices.
pub trait HapticBackend {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Initialises the subsystem and lists candidate devices.
    fn discover(&self) -> Result<Vec<DeviceCandidate>, BackendError>;

    /// Opens one candidate for actuation.
    fn open(&self, candidate: &DeviceCandidate) -> Result<Box<dyn HapticDevice>, ActuationError>;
}

/// A device owned by the registry together with its descriptive metadata.
pub struct RegisteredDevice {
    pub name: String,
    pub path: String,
    pub device: Box<dyn HapticDevice>,
}

/// The ordered set of opened devices.
///
/// Indices are assigned at construction and never change; the list is
/// read-only afterwards, so lookups need no locking.
pub struct DeviceRegistry {
    devices: Vec<RegisteredDevice>,
}

impl DeviceRegistry {
    /// Discovers and opens every rumble-capable device the backend offers.
    ///
    /// Devices without rumble support and devices that fail to open are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Backend`] if enumeration fails,
    /// [`RegistryError::NoDevicesPresent`] if nothing was found and
    /// [`RegistryError::NoDevicesOpened`] if nothing could be opened.
    pub fn open_all(backend: &dyn HapticBackend) -> Result<Self, RegistryError> {
        let candidates = backend.discover()?;
        if candidates.is_empty() {
            return Err(RegistryError::NoDevicesPresent);
        }
        info!(
            backend = backend.name(),
            candidates = candidates.len(),
            "enumerated input devices"
        );

        let mut devices = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if !candidate.supports_rumble {
                warn!(
                    position = candidate.position,
                    path = %candidate.path,
                    "{} is not a rumble-capable controller; skipping",
                    candidate.name
                );
                continue;
            }

            match backend.open(candidate) {
                Ok(device) => {
                    info!(
                        index = devices.len(),
                        path = %candidate.path,
                        "controller {} ({}) opened",
                        candidate.position,
                        candidate.name
                    );
                    devices.push(RegisteredDevice {
                        name: candidate.name.clone(),
                        path: candidate.path.clone(),
                        device,
                    });
                }
                Err(e) => {
                    error!(
                        path = %candidate.path,
                        "failed to open controller {} ({}): {e}",
                        candidate.position,
                        candidate.name
                    );
                }
            }
        }

        if devices.is_empty() {
            return Err(RegistryError::NoDevicesOpened);
        }
        Ok(Self { devices })
    }

    /// Builds a registry from devices that are already open.
    pub fn from_devices(devices: Vec<RegisteredDevice>) -> Self {
        Self { devices }
    }

    /// Number of opened devices.
    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Product name of the device at `index`, if any.
    pub fn name(&self, index: DeviceIndex) -> Option<&str> {
        self.devices.get(index.get()).map(|d| d.name.as_str())
    }

    /// Iterates `(index, name, path)` for every opened device.
    pub fn describe(&self) -> impl Iterator<Item = (usize, &str, &str)> {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, d)| (i, d.name.as_str(), d.path.as_str()))
    }

    /// Starts a rumble on the device at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError`] if there is no such device or the device
    /// refuses the effect.
    pub fn actuate(
        &mut self,
        index: DeviceIndex,
        low: u16,
        high: u16,
        duration_ms: u32,
    ) -> Result<(), ActuationError> {
        let entry = self
            .devices
            .get_mut(index.get())
            .ok_or(ActuationError::NoSuchDevice(index))?;
        entry
            .device
            .rumble(low, high, Duration::from_millis(u64::from(duration_ms)))
    }

    /// Forces the device at `index` back to rest (zero magnitudes, zero duration).
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError`] if there is no such device or the stop fails.
    pub fn stop(&mut self, index: DeviceIndex) -> Result<(), ActuationError> {
        let entry = self
            .devices
            .get_mut(index.get())
            .ok_or(ActuationError::NoSuchDevice(index))?;
        entry.device.stop()
    }

    /// Closes every device.  Called once, after the server loop has finished.
    pub fn close_all(self) {
        for (index, mut entry) in self.devices.into_iter().enumerate() {
            entry.device.close();
            info!(index, "controller {} closed", entry.name);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    /// Backend that hands out mock devices for a fixed candidate list.
    struct ScriptedBackend {
        candidates: Vec<DeviceCandidate>,
        failing_positions: Vec<usize>,
        discover_fails: bool,
    }

    impl ScriptedBackend {
        fn with_candidates(candidates: Vec<DeviceCandidate>) -> Self {
            Self {
                candidates,
                failing_positions: Vec::new(),
                discover_fails: false,
            }
        }
    }

    impl HapticBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn discover(&self) -> Result<Vec<DeviceCandidate>, BackendError> {
            if self.discover_fails {
                return Err(BackendError::Unsupported { backend: "scripted" });
            }
            Ok(self.candidates.clone())
        }

        fn open(
            &self,
            candidate: &DeviceCandidate,
        ) -> Result<Box<dyn HapticDevice>, ActuationError> {
            if self.failing_positions.contains(&candidate.position) {
                return Err(ActuationError::Platform("open refused".to_string()));
            }
            Ok(Box::new(MockHapticDevice::new()))
        }
    }

    fn candidate(position: usize, name: &str, supports_rumble: bool) -> DeviceCandidate {
        DeviceCandidate {
            position,
            path: format!("/dev/input/event{position}"),
            name: name.to_string(),
            supports_rumble,
        }
    }

    fn registry_of(devices: Vec<MockHapticDevice>) -> DeviceRegistry {
        DeviceRegistry::from_devices(
            devices
                .into_iter()
                .enumerate()
                .map(|(i, d)| RegisteredDevice {
                    name: format!("pad-{i}"),
                    path: format!("mock:{i}"),
                    device: Box::new(d) as Box<dyn HapticDevice>,
                })
                .collect(),
        )
    }

    fn index(raw: i32, count: usize) -> DeviceIndex {
        DeviceIndex::validate(raw, count).unwrap()
    }

    // ── open_all ──────────────────────────────────────────────────────────────

    #[test]
    fn test_open_all_skips_devices_without_rumble_and_failed_opens() {
        // Arrange
        let mut backend = ScriptedBackend::with_candidates(vec![
            candidate(0, "Keyboard", false),
            candidate(1, "Pad A", true),
            candidate(2, "Pad B", true),
            candidate(3, "Pad C", true),
        ]);
        backend.failing_positions.push(2);

        // Act
        let registry = DeviceRegistry::open_all(&backend).unwrap();

        // Assert – indices are contiguous over the devices that opened
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.name(index(0, 2)), Some("Pad A"));
        assert_eq!(registry.name(index(1, 2)), Some("Pad C"));
    }

    #[test]
    fn test_open_all_with_no_candidates_reports_no_devices_present() {
        let backend = ScriptedBackend::with_candidates(Vec::new());
        let result = DeviceRegistry::open_all(&backend);
        assert!(matches!(result, Err(RegistryError::NoDevicesPresent)));
    }

    #[test]
    fn test_open_all_when_every_open_fails_reports_no_devices_opened() {
        let mut backend = ScriptedBackend::with_candidates(vec![candidate(0, "Pad", true)]);
        backend.failing_positions.push(0);
        let result = DeviceRegistry::open_all(&backend);
        assert!(matches!(result, Err(RegistryError::NoDevicesOpened)));
    }

    #[test]
    fn test_open_all_with_only_non_rumble_devices_reports_no_devices_opened() {
        let backend = ScriptedBackend::with_candidates(vec![candidate(0, "Mouse", false)]);
        let result = DeviceRegistry::open_all(&backend);
        assert!(matches!(result, Err(RegistryError::NoDevicesOpened)));
    }

    #[test]
    fn test_open_all_propagates_backend_failure() {
        let mut backend = ScriptedBackend::with_candidates(vec![candidate(0, "Pad", true)]);
        backend.discover_fails = true;
        let result = DeviceRegistry::open_all(&backend);
        assert!(matches!(result, Err(RegistryError::Backend(_))));
    }

    // ── actuate / stop ────────────────────────────────────────────────────────

    #[test]
    fn test_actuate_routes_to_the_indexed_device() {
        // Arrange
        let untouched = MockHapticDevice::new();
        let mut target = MockHapticDevice::new();
        target
            .expect_rumble()
            .with(eq(100u16), eq(200u16), eq(Duration::from_millis(300)))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut registry = registry_of(vec![untouched, target]);

        // Act
        let result = registry.actuate(index(1, 2), 100, 200, 300);

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_actuate_surfaces_device_error() {
        let mut device = MockHapticDevice::new();
        device
            .expect_rumble()
            .returning(|_, _, _| Err(ActuationError::Unsupported));
        let mut registry = registry_of(vec![device]);

        let result = registry.actuate(index(0, 1), 1, 1, 1);

        assert!(matches!(result, Err(ActuationError::Unsupported)));
    }

    #[test]
    fn test_actuate_with_index_from_a_larger_set_reports_no_such_device() {
        let mut registry = registry_of(vec![MockHapticDevice::new()]);
        let result = registry.actuate(index(3, 8), 1, 1, 1);
        assert!(matches!(result, Err(ActuationError::NoSuchDevice(_))));
    }

    #[test]
    fn test_stop_calls_device_stop() {
        let mut device = MockHapticDevice::new();
        device.expect_stop().times(1).returning(|| Ok(()));
        let mut registry = registry_of(vec![device]);

        assert!(registry.stop(index(0, 1)).is_ok());
    }

    #[test]
    fn test_close_all_closes_every_device_once() {
        let devices = (0..3)
            .map(|_| {
                let mut d = MockHapticDevice::new();
                d.expect_close().times(1).return_const(());
                d
            })
            .collect();
        let registry = registry_of(devices);

        registry.close_all();
    }

    #[test]
    fn test_describe_lists_devices_in_index_order() {
        let registry = registry_of(vec![MockHapticDevice::new(), MockHapticDevice::new()]);
        let names: Vec<_> = registry.describe().map(|(i, name, _)| (i, name.to_string())).collect();
        assert_eq!(names, vec![(0, "pad-0".to_string()), (1, "pad-1".to_string())]);
    }
}
