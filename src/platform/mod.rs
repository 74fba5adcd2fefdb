//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the peripherals the protocol
//! core consumes: the flash command sequencer, the byte-oriented UART
//! transport, and the real-time clock. All register-level code lives behind
//! these traits so the protocol and storage layers are testable on the host.

pub mod error;
pub mod traits;

// In-memory peripheral implementations (feature-gated)
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{RtcError, SequencerError, UartError};
pub use traits::{FlashSequencer, RtcInterface, SequencerCommand, SequencerStatus, UartInterface};
