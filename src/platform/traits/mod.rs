//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod rtc;
pub mod sequencer;
pub mod uart;

// Re-export trait interfaces
pub use rtc::RtcInterface;
pub use sequencer::{FlashSequencer, SequencerCommand, SequencerStatus, PHRASE_LEN};
pub use uart::UartInterface;
