//! Device index validation.
//!
//! Devices are numbered `0..count` in the order the daemon opened them at
//! startup.  The set never changes while the daemon runs, so a bounds check
//! against the count taken at that moment is the whole rule.

use std::fmt;

use thiserror::Error;

/// Reasons a requested device index cannot be used.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum IndexError {
    #[error("device index {0} is negative")]
    Negative(i32),
    #[error("device index {index} is out of range ({count} device(s) open)")]
    OutOfRange { index: i32, count: usize },
}

/// An index that has been checked against the open device count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceIndex(usize);

impl DeviceIndex {
    /// Checks `raw` against `count` open devices.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Negative`] for `raw < 0` and
    /// [`IndexError::OutOfRange`] for `raw >= count`.
    pub fn validate(raw: i32, count: usize) -> Result<Self, IndexError> {
        let index = usize::try_from(raw).map_err(|_| IndexError::Negative(raw))?;
        if index >= count {
            return Err(IndexError::OutOfRange { index: raw, count });
        }
        Ok(Self(index))
    }

    /// The position of the device in the registry.
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
