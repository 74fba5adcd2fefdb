//! Crate-level error type
//!
//! Subsystems carry their own error enums; `TowerError` aggregates them for
//! callers that drive the whole device loop and want a single error channel.

use crate::communication::tower::dispatcher::CommandError;
use crate::communication::tower::pipe::PipeError;
use crate::parameters::InitError;
use crate::platform::error::{RtcError, SequencerError, UartError};
use crate::storage::StoreError;
use core::fmt;

/// Result alias over [`TowerError`]
pub type Result<T> = core::result::Result<T, TowerError>;

/// Any failure the device loop can surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowerError {
    /// Byte pipe capacity violation
    Pipe(PipeError),
    /// Non-volatile store failure
    Store(StoreError),
    /// Command handler failure
    Command(CommandError),
    /// UART transport failure
    Uart(UartError),
    /// Real-time clock failure
    Rtc(RtcError),
    /// The variable store could not hold the device configuration (fatal)
    AllocationExhausted,
}

impl fmt::Display for TowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TowerError::Pipe(e) => write!(f, "pipe: {e}"),
            TowerError::Store(e) => write!(f, "store: {e}"),
            TowerError::Command(e) => write!(f, "command: {e}"),
            TowerError::Uart(e) => write!(f, "uart: {e}"),
            TowerError::Rtc(e) => write!(f, "rtc: {e}"),
            TowerError::AllocationExhausted => write!(f, "variable store exhausted at startup"),
        }
    }
}

impl From<PipeError> for TowerError {
    fn from(e: PipeError) -> Self {
        TowerError::Pipe(e)
    }
}

impl From<StoreError> for TowerError {
    fn from(e: StoreError) -> Self {
        TowerError::Store(e)
    }
}

impl From<CommandError> for TowerError {
    fn from(e: CommandError) -> Self {
        TowerError::Command(e)
    }
}

impl From<UartError> for TowerError {
    fn from(e: UartError) -> Self {
        TowerError::Uart(e)
    }
}

impl From<RtcError> for TowerError {
    fn from(e: RtcError) -> Self {
        TowerError::Rtc(e)
    }
}

impl From<SequencerError> for TowerError {
    fn from(e: SequencerError) -> Self {
        TowerError::Store(StoreError::Sequencer(e))
    }
}

impl From<InitError> for TowerError {
    fn from(e: InitError) -> Self {
        match e {
            InitError::AllocationExhausted => TowerError::AllocationExhausted,
            InitError::Store(inner) => TowerError::Store(inner),
        }
    }
}
