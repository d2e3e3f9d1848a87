//! Mock haptic backend for tests and dry runs.
//!
//! The real evdev backend talks to `/dev/input` nodes, which need physical
//! controllers and permissions that a test machine rarely has.  The mock
//! backend replaces every device call with a record pushed into a shared
//! [`ActuationLog`], so tests can assert exactly which calls were made, in
//! what order and at what time.
//!
//! # Usage in tests
//!
//! ```ignore
//! let backend = MockHapticBackend::new(2);
//! let log = backend.log();
//! let mut registry = DeviceRegistry::open_all(&backend).unwrap();
//!
//! registry.actuate(DeviceIndex::validate(0, 2)?, 100, 200, 50)?;
//!
//! let expected = ActuationKind::Rumble { low: 100, high: 200, duration_ms: 50 };
//! assert_eq!(log.kinds(), vec![(0, expected)]);
//! ```
//!
//! # Failure injection
//!
//! [`MockHapticBackend::with_unopenable`] makes `open` fail for a position and
//! [`MockHapticBackend::with_failing_rumble`] makes that controller refuse to
//! start a rumble.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::info;

use crate::application::devices::{
    ActuationError, BackendError, DeviceCandidate, HapticBackend, HapticDevice,
};

/// What a mock controller was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationKind {
    Rumble { low: u16, high: u16, duration_ms: u32 },
    Stop,
    Close,
}

/// One recorded call.
#[derive(Debug, Clone, Copy)]
pub struct ActuationRecord {
    /// Enumeration position of the controller.
    pub device: usize,
    pub kind: ActuationKind,
    pub at: Instant,
}

/// Shared, append-only record of every mock device call.
#[derive(Debug, Clone, Default)]
pub struct ActuationLog {
    records: Arc<Mutex<Vec<ActuationRecord>>>,
}

impl ActuationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActuationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, device: usize, kind: ActuationKind) {
        self.lock().push(ActuationRecord {
            device,
            kind,
            at: Instant::now(),
        });
    }

    /// Copy of all records so far.
    pub fn snapshot(&self) -> Vec<ActuationRecord> {
        self.lock().clone()
    }

    /// `(device, kind)` pairs without timestamps.
    pub fn kinds(&self) -> Vec<(usize, ActuationKind)> {
        self.lock().iter().map(|r| (r.device, r.kind)).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// A simulated controller.
pub struct MockController {
    position: usize,
    name: String,
    log: ActuationLog,
    /// When `true`, `rumble` returns an `ActuationError::Platform`.
    pub should_fail: bool,
}

impl HapticDevice for MockController {
    fn rumble(&mut self, low: u16, high: u16, duration: Duration) -> Result<(), ActuationError> {
        if self.should_fail {
            return Err(ActuationError::Platform("mock failure".into()));
        }
        let duration_ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        info!(controller = %self.name, low, high, duration_ms, "simulated rumble");
        self.log.push(
            self.position,
            ActuationKind::Rumble {
                low,
                high,
                duration_ms,
            },
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ActuationError> {
        self.log.push(self.position, ActuationKind::Stop);
        Ok(())
    }

    fn close(&mut self) {
        self.log.push(self.position, ActuationKind::Close);
    }
}

/// Backend that offers a fixed number of simulated controllers.
#[derive(Debug, Clone)]
pub struct MockHapticBackend {
    device_count: usize,
    unopenable: Vec<usize>,
    failing_rumble: Vec<usize>,
    log: ActuationLog,
}

impl MockHapticBackend {
    /// Creates a backend with `device_count` rumble-capable controllers.
    pub fn new(device_count: usize) -> Self {
        Self {
            device_count,
            unopenable: Vec::new(),
            failing_rumble: Vec::new(),
            log: ActuationLog::new(),
        }
    }

    /// Makes `open` fail for the controller at `position`.
    pub fn with_unopenable(mut self, position: usize) -> Self {
        self.unopenable.push(position);
        self
    }

    /// Makes the controller at `position` refuse every rumble.
    pub fn with_failing_rumble(mut self, position: usize) -> Self {
        self.failing_rumble.push(position);
        self
    }

    /// Handle to the log shared by every controller this backend opens.
    pub fn log(&self) -> ActuationLog {
        self.log.clone()
    }
}

impl HapticBackend for MockHapticBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn discover(&self) -> Result<Vec<DeviceCandidate>, BackendError> {
        Ok((0..self.device_count)
            .map(|position| DeviceCandidate {
                position,
                path: format!("mock:{position}"),
                name: format!("Mock Controller {position}"),
                supports_rumble: true,
            })
            .collect())
    }

    fn open(&self, candidate: &DeviceCandidate) -> Result<Box<dyn HapticDevice>, ActuationError> {
        if self.unopenable.contains(&candidate.position) {
            return Err(ActuationError::Platform("mock open failure".into()));
        }
        Ok(Box::new(MockController {
            position: candidate.position,
            name: candidate.name.clone(),
            log: self.log.clone(),
            should_fail: self.failing_rumble.contains(&candidate.position),
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::devices::DeviceRegistry;
    use rumble_core::DeviceIndex;

    #[test]
    fn test_mock_backend_discovers_requested_number_of_controllers() {
        let backend = MockHapticBackend::new(4);
        let candidates = backend.discover().unwrap();
        assert_eq!(candidates.len(), 4);
        assert!(candidates.iter().all(|c| c.supports_rumble));
        assert_eq!(candidates[2].path, "mock:2");
    }

    #[test]
    fn test_mock_controller_records_rumble_stop_and_close_in_order() {
        // Arrange
        let backend = MockHapticBackend::new(1);
        let log = backend.log();
        let mut registry = DeviceRegistry::open_all(&backend).unwrap();
        let index = DeviceIndex::validate(0, 1).unwrap();

        // Act
        registry.actuate(index, 100, 200, 50).unwrap();
        registry.stop(index).unwrap();
        registry.close_all();

        // Assert
        assert_eq!(
            log.kinds(),
            vec![
                (
                    0,
                    ActuationKind::Rumble {
                        low: 100,
                        high: 200,
                        duration_ms: 50
                    }
                ),
                (0, ActuationKind::Stop),
                (0, ActuationKind::Close),
            ]
        );
    }

    #[test]
    fn test_unopenable_controller_is_skipped_by_registry() {
        let backend = MockHapticBackend::new(3).with_unopenable(1);
        let registry = DeviceRegistry::open_all(&backend).unwrap();
        let paths: Vec<_> = registry.describe().map(|(_, _, path)| path.to_string()).collect();
        assert_eq!(paths, vec!["mock:0", "mock:2"]);
    }

    #[test]
    fn test_failing_rumble_is_reported_and_not_recorded() {
        let backend = MockHapticBackend::new(1).with_failing_rumble(0);
        let log = backend.log();
        let mut registry = DeviceRegistry::open_all(&backend).unwrap();

        let result = registry.actuate(DeviceIndex::validate(0, 1).unwrap(), 1, 1, 1);

        assert!(matches!(result, Err(ActuationError::Platform(_))));
        assert!(log.is_empty());
    }

    #[test]
    fn test_log_timestamps_are_monotonic() {
        let log = ActuationLog::new();
        log.push(0, ActuationKind::Stop);
        log.push(1, ActuationKind::Stop);
        let records = log.snapshot();
        assert_eq!(log.len(), 2);
        assert!(records[1].at >= records[0].at);
    }
}
