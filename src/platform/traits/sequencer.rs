//! Flash command sequencer trait
//!
//! The flash hardware is driven through a command sequencer: software builds
//! a command descriptor (opcode, 24-bit flash address, up to one phrase of
//! data), writes it to the command registers, clears a start flag to launch,
//! and polls a completion flag. Error flags are checked after completion.
//!
//! # Flash Characteristics
//!
//! - The smallest programmable unit is a *phrase* (8 bytes)
//! - The smallest erasable unit is a *sector* (larger than a phrase)
//! - Erase sets all bytes to 0xFF; programming can only clear bits 1→0
//! - A byte can only be altered by erasing its sector and reprogramming the
//!   containing phrase in full
//!
//! The sequencer supports one in-flight command; callers submit and then
//! poll [`FlashSequencer::is_complete`] before issuing the next command.

use crate::platform::error::SequencerError;
use bitflags::bitflags;

/// Phrase length in bytes: the hardware program unit
pub const PHRASE_LEN: usize = 8;

/// Program-phrase command opcode
pub const OP_PROGRAM_PHRASE: u8 = 0x07;

/// Erase-sector command opcode
pub const OP_ERASE_SECTOR: u8 = 0x09;

bitflags! {
    /// Sequencer status register flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SequencerStatus: u8 {
        /// Command complete interrupt flag (set when idle)
        const COMPLETE = 1 << 7;
        /// Access error flag
        const ACCESS_ERROR = 1 << 5;
        /// Protection violation flag
        const PROTECTION_VIOLATION = 1 << 4;
    }
}

/// One sequencer command descriptor
///
/// Mirrors the hardware command object layout: an opcode byte, a 24-bit
/// flash address, and one phrase of data (meaningful for program commands
/// only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerCommand {
    /// Command opcode
    pub opcode: u8,
    /// Flash address (only the low 24 bits reach the hardware)
    pub address: u32,
    /// Phrase data for program commands
    pub data: [u8; PHRASE_LEN],
}

impl SequencerCommand {
    /// Build a program-phrase command
    ///
    /// `address` must be phrase-aligned; the sequencer implementation
    /// rejects misaligned addresses.
    pub fn program_phrase(address: u32, data: [u8; PHRASE_LEN]) -> Self {
        Self {
            opcode: OP_PROGRAM_PHRASE,
            address,
            data,
        }
    }

    /// Build an erase-sector command for the sector containing `address`
    pub fn erase_sector(address: u32) -> Self {
        Self {
            opcode: OP_ERASE_SECTOR,
            address,
            data: [0xFF; PHRASE_LEN],
        }
    }
}

/// Flash command sequencer interface
///
/// Platform implementations drive the real command registers; the mock backs
/// the same protocol with an in-memory byte array.
///
/// # Safety Invariants
///
/// - One in-flight command at a time; submit only when `is_complete()` holds
/// - The caller owns the poll loop (the trait never blocks internally)
pub trait FlashSequencer {
    /// Submit a command to the hardware and launch it
    ///
    /// # Errors
    ///
    /// Returns `SequencerError::InvalidAddress` if the command addresses
    /// memory outside the device's flash or violates alignment rules.
    fn submit(&mut self, command: &SequencerCommand) -> Result<(), SequencerError>;

    /// Poll the command-complete flag
    fn is_complete(&self) -> bool;

    /// Read the status flags
    fn status(&self) -> SequencerStatus;

    /// Clear latched error flags before launching a command
    fn clear_status(&mut self);

    /// Memory-mapped flash read
    ///
    /// Fills `buf` from flash starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns `SequencerError::InvalidAddress` if the range falls outside
    /// the device's flash.
    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), SequencerError>;
}
