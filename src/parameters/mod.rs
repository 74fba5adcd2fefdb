//! Persistent device configuration
//!
//! The device carries two half-word identity values in non-volatile storage:
//! a device number and a device mode. On startup both are allocated from the
//! variable store in a fixed order, so they land at the same addresses every
//! boot; a value reading back as the erased pattern (0xFFFF) is replaced with
//! its factory default.

use crate::log_info;
use crate::storage::{NvSize, NvSlot, NvStore, StoreError};
use crate::platform::traits::FlashSequencer;
use core::fmt;

/// Factory-default device number
pub const DEFAULT_DEVICE_NUMBER: u16 = 0x0DA2;

/// Factory-default device mode
pub const DEFAULT_DEVICE_MODE: u16 = 0x0001;

/// Erased flash pattern for a half-word
const ERASED: u16 = 0xFFFF;

/// Configuration startup failures
///
/// Any of these is fatal for the device: without its identity values the
/// protocol cannot answer the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The variable store could not provide both slots
    AllocationExhausted,
    /// Reading or programming a value failed
    Store(StoreError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::AllocationExhausted => write!(f, "variable store exhausted at startup"),
            InitError::Store(e) => write!(f, "configuration storage: {e}"),
        }
    }
}

impl From<StoreError> for InitError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Exhausted => InitError::AllocationExhausted,
            other => InitError::Store(other),
        }
    }
}

/// Slots holding the device's persistent identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    number: NvSlot,
    mode: NvSlot,
}

impl DeviceConfig {
    /// Allocate the configuration slots and seed factory defaults
    ///
    /// Must run before any command handling. Values already present in flash
    /// are kept; only the erased pattern is replaced.
    ///
    /// # Errors
    ///
    /// Returns `InitError::AllocationExhausted` when the store cannot hold
    /// both values, or `InitError::Store` when flash access fails.
    pub fn init<S: FlashSequencer>(store: &mut NvStore<S>) -> Result<Self, InitError> {
        let number = store.allocate(NvSize::Half)?;
        let mode = store.allocate(NvSize::Half)?;

        if store.read16(number.address())? == ERASED {
            log_info!("device number erased, seeding default {:#06x}", DEFAULT_DEVICE_NUMBER);
            store.write16(number.address(), DEFAULT_DEVICE_NUMBER)?;
        }
        if store.read16(mode.address())? == ERASED {
            log_info!("device mode erased, seeding default {:#06x}", DEFAULT_DEVICE_MODE);
            store.write16(mode.address(), DEFAULT_DEVICE_MODE)?;
        }

        Ok(Self { number, mode })
    }

    /// Current device number
    pub fn number<S: FlashSequencer>(&self, store: &NvStore<S>) -> Result<u16, StoreError> {
        store.read16(self.number.address())
    }

    /// Persist a new device number
    pub fn set_number<S: FlashSequencer>(
        &self,
        store: &mut NvStore<S>,
        value: u16,
    ) -> Result<(), StoreError> {
        store.write16(self.number.address(), value)
    }

    /// Current device mode
    pub fn mode<S: FlashSequencer>(&self, store: &NvStore<S>) -> Result<u16, StoreError> {
        store.read16(self.mode.address())
    }

    /// Persist a new device mode
    pub fn set_mode<S: FlashSequencer>(
        &self,
        store: &mut NvStore<S>,
        value: u16,
    ) -> Result<(), StoreError> {
        store.write16(self.mode.address(), value)
    }
}
