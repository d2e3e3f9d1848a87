//! ServerContext: the explicit state shared by the server loop and the
//! connection handler.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::application::devices::DeviceRegistry;

/// Process-wide shutdown request, set once and never cleared.
///
/// Clones share the same flag.  Writes and reads are single atomic
/// operations, so the flag can be set from a signal task while the server
/// loop polls it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates a flag in the "running" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.  Idempotent.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

/// Owns the device registry and the shutdown flag for one server run.
pub struct ServerContext {
    registry: DeviceRegistry,
    shutdown: ShutdownFlag,
}

impl ServerContext {
    pub fn new(registry: DeviceRegistry, shutdown: ShutdownFlag) -> Self {
        Self { registry, shutdown }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    pub fn shutdown(&self) -> &ShutdownFlag {
        &self.shutdown
    }

    /// Gives the registry back so it can be closed after the server stops.
    pub fn into_registry(self) -> DeviceRegistry {
        self.registry
    }
}
