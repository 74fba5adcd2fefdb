//! Mock flash command sequencer
//!
//! Simulates the hardware command sequencer over an in-memory sector image.
//! Supports:
//! - Program-phrase and erase-sector commands
//! - 1→0 programming semantics (a program can never set bits)
//! - Latched error-flag injection for testing failure paths
//! - Completion latency and stall simulation for testing the bounded wait
//! - Erase count tracking
//!
//! # Example
//!
//! ```
//! use tower_link::platform::mock::MockSequencer;
//! use tower_link::platform::traits::{FlashSequencer, SequencerCommand};
//!
//! let mut sequencer = MockSequencer::new();
//! let base = MockSequencer::SECTOR_BASE;
//!
//! sequencer.submit(&SequencerCommand::erase_sector(base)).unwrap();
//! while !sequencer.is_complete() {}
//!
//! sequencer
//!     .submit(&SequencerCommand::program_phrase(base, [0x11; 8]))
//!     .unwrap();
//! while !sequencer.is_complete() {}
//!
//! let mut buf = [0u8; 8];
//! sequencer.read(base, &mut buf).unwrap();
//! assert_eq!(buf, [0x11; 8]);
//! ```

use crate::platform::error::SequencerError;
use crate::platform::traits::sequencer::{
    FlashSequencer, SequencerCommand, SequencerStatus, OP_ERASE_SECTOR, OP_PROGRAM_PHRASE,
    PHRASE_LEN,
};
use core::cell::Cell;

/// Simulated erase sector length (4 KiB)
const SECTOR_LEN: usize = 4096;

/// Completion latency in polls for a freshly submitted command
const DEFAULT_LATENCY: usize = 2;

/// Mock flash command sequencer
///
/// Models the single flash sector holding the device's data region. Commands
/// addressing anything else are rejected with `InvalidAddress`.
#[derive(Debug)]
pub struct MockSequencer {
    /// Sector image (0xFF = erased)
    memory: [u8; SECTOR_LEN],
    /// Status flags; COMPLETE models the command-complete flag
    status: Cell<SequencerStatus>,
    /// Polls remaining until the in-flight command completes
    pending_polls: Cell<usize>,
    /// Error flags to latch when the next command completes
    injected: Cell<SequencerStatus>,
    /// When set, the next submitted command never completes
    stalled: Cell<bool>,
    /// Number of erase commands executed
    erase_count: u32,
}

impl MockSequencer {
    /// Base address of the simulated data sector
    pub const SECTOR_BASE: u32 = 0x0008_0000;

    /// Create a new mock sequencer with an erased sector
    pub fn new() -> Self {
        Self {
            memory: [0xFF; SECTOR_LEN],
            status: Cell::new(SequencerStatus::COMPLETE),
            pending_polls: Cell::new(0),
            injected: Cell::new(SequencerStatus::empty()),
            stalled: Cell::new(false),
            erase_count: 0,
        }
    }

    /// Latch the given error flag when the next command completes
    pub fn inject_fault(&mut self, fault: SequencerError) {
        let flag = match fault {
            SequencerError::AccessError => SequencerStatus::ACCESS_ERROR,
            SequencerError::ProtectionViolation => SequencerStatus::PROTECTION_VIOLATION,
            SequencerError::InvalidAddress => SequencerStatus::ACCESS_ERROR,
        };
        self.injected.set(flag);
    }

    /// Make the next command hang forever (completion flag never sets)
    pub fn stall_next_command(&mut self) {
        self.stalled.set(true);
    }

    /// Number of erase-sector commands executed so far
    pub fn erase_count(&self) -> u32 {
        self.erase_count
    }

    /// Sector contents for test verification
    pub fn contents(&self, address: u32, len: usize) -> &[u8] {
        let offset = (address - Self::SECTOR_BASE) as usize;
        &self.memory[offset..offset + len]
    }

    fn offset_of(&self, address: u32, len: usize) -> Result<usize, SequencerError> {
        if address < Self::SECTOR_BASE {
            return Err(SequencerError::InvalidAddress);
        }
        let offset = (address - Self::SECTOR_BASE) as usize;
        if offset + len > SECTOR_LEN {
            return Err(SequencerError::InvalidAddress);
        }
        Ok(offset)
    }
}

impl Default for MockSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashSequencer for MockSequencer {
    fn submit(&mut self, command: &SequencerCommand) -> Result<(), SequencerError> {
        match command.opcode {
            OP_ERASE_SECTOR => {
                if command.address % SECTOR_LEN as u32 != 0 {
                    return Err(SequencerError::InvalidAddress);
                }
                self.offset_of(command.address, SECTOR_LEN)?;
                self.memory.fill(0xFF);
                self.erase_count += 1;
            }
            OP_PROGRAM_PHRASE => {
                if command.address % PHRASE_LEN as u32 != 0 {
                    return Err(SequencerError::InvalidAddress);
                }
                let offset = self.offset_of(command.address, PHRASE_LEN)?;
                // Flash programming can only clear bits
                for (cell, byte) in self.memory[offset..offset + PHRASE_LEN]
                    .iter_mut()
                    .zip(command.data)
                {
                    *cell &= byte;
                }
            }
            _ => return Err(SequencerError::AccessError),
        }

        // Busy until the latency elapses (or forever when stalled)
        self.status.set(self.status.get() - SequencerStatus::COMPLETE);
        let latency = if self.stalled.replace(false) {
            usize::MAX
        } else {
            DEFAULT_LATENCY
        };
        self.pending_polls.set(latency);
        Ok(())
    }

    fn is_complete(&self) -> bool {
        if self.status.get().contains(SequencerStatus::COMPLETE) {
            return true;
        }
        let remaining = self.pending_polls.get();
        if remaining > 1 {
            self.pending_polls.set(remaining - 1);
            return false;
        }
        // Command retires: set COMPLETE plus any injected error flags
        let mut status = self.status.get() | SequencerStatus::COMPLETE;
        status |= self.injected.replace(SequencerStatus::empty());
        self.status.set(status);
        true
    }

    fn status(&self) -> SequencerStatus {
        self.status.get()
    }

    fn clear_status(&mut self) {
        let cleared = self.status.get()
            - (SequencerStatus::ACCESS_ERROR | SequencerStatus::PROTECTION_VIOLATION);
        self.status.set(cleared);
    }

    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), SequencerError> {
        let offset = self.offset_of(address, buf.len())?;
        buf.copy_from_slice(&self.memory[offset..offset + buf.len()]);
        Ok(())
    }
}
