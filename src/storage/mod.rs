//! Non-volatile variable store
//!
//! Persists small configuration variables (1, 2 or 4 bytes) in a reserved
//! flash data region, hiding the sector-erase/phrase-program hardware model
//! behind simple read/write calls.
//!
//! # Write path
//!
//! Flash programming can only clear bits, so an in-place overwrite is
//! impossible. Every write reconstructs the full data-region image in RAM,
//! patches the target bytes, erases the sector and reprograms the phrases
//! that are not fully erased. Variables sharing a phrase with the target, or
//! living in other phrases, always survive a write.
//!
//! Narrow writes cascade upward: a byte write reads its containing half-word
//! and rewrites it, a half-word write rewrites its containing word, and a
//! word write rewrites its containing phrase. Multi-byte values are stored
//! little-endian.
//!
//! # Allocation
//!
//! Slots are handed out first-fit with natural alignment (an n-byte variable
//! sits at an offset divisible by n). Allocation is bookkeeping only; no
//! flash command is issued until the first write.

use crate::log_error;
use crate::platform::error::SequencerError;
use crate::platform::traits::{FlashSequencer, SequencerCommand, SequencerStatus, PHRASE_LEN};
use core::fmt;

/// First address of the flash data region
pub const FLASH_DATA_START: u32 = 0x0008_0000;

/// Data region length in bytes
pub const FLASH_DATA_SIZE: usize = 32;

/// Poll budget for one sequencer command
///
/// Real erase commands finish in well under this many polls; exceeding the
/// budget means the hardware wedged and the store reports it instead of
/// spinning forever.
const SEQUENCER_POLL_LIMIT: usize = 10_000;

/// Variable store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No free region of the requested size and alignment remains
    Exhausted,
    /// Address violates the alignment rule for the access width
    Misaligned,
    /// Address range falls outside the data region
    OutOfRange,
    /// The sequencer rejected or faulted a command
    Sequencer(SequencerError),
    /// The sequencer never raised its completion flag
    SequencerTimeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Exhausted => write!(f, "data region exhausted"),
            StoreError::Misaligned => write!(f, "misaligned access"),
            StoreError::OutOfRange => write!(f, "address outside data region"),
            StoreError::Sequencer(e) => write!(f, "sequencer: {e}"),
            StoreError::SequencerTimeout => write!(f, "sequencer command timed out"),
        }
    }
}

impl From<SequencerError> for StoreError {
    fn from(e: SequencerError) -> Self {
        StoreError::Sequencer(e)
    }
}

/// Variable width supported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvSize {
    /// One byte
    Byte = 1,
    /// Half-word, two bytes
    Half = 2,
    /// Word, four bytes
    Word = 4,
}

impl NvSize {
    /// Width in bytes
    pub const fn len(self) -> usize {
        self as usize
    }
}

/// Handle to an allocated non-volatile variable
///
/// Produced by [`NvStore::allocate`]; the address is guaranteed in-range and
/// naturally aligned for the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NvSlot {
    address: u32,
    size: NvSize,
}

impl NvSlot {
    /// Flash address of the variable
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Variable width
    pub const fn size(&self) -> NvSize {
        self.size
    }
}

/// Non-volatile variable store over a flash command sequencer
pub struct NvStore<S: FlashSequencer> {
    sequencer: S,
    /// One flag per data-region byte; true = handed out
    occupancy: [bool; FLASH_DATA_SIZE],
}

impl<S: FlashSequencer> NvStore<S> {
    /// Create a store over `sequencer` with nothing allocated
    pub fn new(sequencer: S) -> Self {
        Self {
            sequencer,
            occupancy: [false; FLASH_DATA_SIZE],
        }
    }

    /// Access the underlying sequencer
    pub fn sequencer(&self) -> &S {
        &self.sequencer
    }

    /// Mutable access to the underlying sequencer
    pub fn sequencer_mut(&mut self) -> &mut S {
        &mut self.sequencer
    }

    /// Reserve the first free, naturally aligned region of `size` bytes
    ///
    /// Allocation order is deterministic, so a fixed startup sequence maps
    /// each variable to the same address on every boot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Exhausted` when no suitable region remains.
    pub fn allocate(&mut self, size: NvSize) -> Result<NvSlot, StoreError> {
        let n = size.len();
        let mut offset = 0;
        while offset + n <= FLASH_DATA_SIZE {
            if self.occupancy[offset..offset + n].iter().all(|&used| !used) {
                for flag in &mut self.occupancy[offset..offset + n] {
                    *flag = true;
                }
                return Ok(NvSlot {
                    address: FLASH_DATA_START + offset as u32,
                    size,
                });
            }
            // Only naturally aligned offsets are candidates
            offset += n;
        }
        Err(StoreError::Exhausted)
    }

    /// Read one byte
    pub fn read8(&self, address: u32) -> Result<u8, StoreError> {
        let mut buf = [0u8; 1];
        self.read_bytes(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a half-word (little-endian, 2-byte aligned)
    pub fn read16(&self, address: u32) -> Result<u16, StoreError> {
        check_aligned(address, 2)?;
        let mut buf = [0u8; 2];
        self.read_bytes(address, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a word (little-endian, 4-byte aligned)
    pub fn read32(&self, address: u32) -> Result<u32, StoreError> {
        check_aligned(address, 4)?;
        let mut buf = [0u8; 4];
        self.read_bytes(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a byte range from the data region
    pub fn read_bytes(&self, address: u32, buf: &mut [u8]) -> Result<(), StoreError> {
        check_range(address, buf.len())?;
        self.sequencer.read(address, buf)?;
        Ok(())
    }

    /// Write one byte
    ///
    /// Rewrites the containing half-word, preserving its other byte.
    pub fn write8(&mut self, address: u32, value: u8) -> Result<(), StoreError> {
        check_range(address, 1)?;
        let base = address & !1;
        let mut half = [0u8; 2];
        self.sequencer.read(base, &mut half)?;
        half[(address - base) as usize] = value;
        self.write16(base, u16::from_le_bytes(half))
    }

    /// Write a half-word (little-endian, 2-byte aligned)
    ///
    /// Rewrites the containing word, preserving its other half.
    pub fn write16(&mut self, address: u32, value: u16) -> Result<(), StoreError> {
        check_aligned(address, 2)?;
        check_range(address, 2)?;
        let base = address & !3;
        let mut word = [0u8; 4];
        self.sequencer.read(base, &mut word)?;
        let offset = (address - base) as usize;
        word[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self.write32(base, u32::from_le_bytes(word))
    }

    /// Write a word (little-endian, 4-byte aligned)
    ///
    /// Rewrites the containing phrase, preserving its other word.
    pub fn write32(&mut self, address: u32, value: u32) -> Result<(), StoreError> {
        check_aligned(address, 4)?;
        check_range(address, 4)?;
        let base = address & !(PHRASE_LEN as u32 - 1);
        let mut phrase = [0u8; PHRASE_LEN];
        self.sequencer.read(base, &mut phrase)?;
        let offset = (address - base) as usize;
        phrase[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self.program_phrase(base, phrase)
    }

    /// Erase the data region
    ///
    /// All bytes read back as 0xFF afterwards. Allocations are unaffected;
    /// erased variables simply hold the erased pattern.
    pub fn erase(&mut self) -> Result<(), StoreError> {
        self.run(&SequencerCommand::erase_sector(FLASH_DATA_START))
    }

    /// Replace one phrase, keeping every other phrase of the region intact
    ///
    /// The whole region image is captured before the erase, so a variable
    /// co-resident in the target phrase or in any other phrase reads back
    /// unchanged afterwards.
    fn program_phrase(
        &mut self,
        address: u32,
        phrase: [u8; PHRASE_LEN],
    ) -> Result<(), StoreError> {
        let mut image = [0u8; FLASH_DATA_SIZE];
        self.sequencer.read(FLASH_DATA_START, &mut image)?;

        let offset = (address - FLASH_DATA_START) as usize;
        image[offset..offset + PHRASE_LEN].copy_from_slice(&phrase);

        self.run(&SequencerCommand::erase_sector(FLASH_DATA_START))?;

        for (index, chunk) in image.chunks_exact(PHRASE_LEN).enumerate() {
            // A fully erased phrase needs no program command
            if chunk.iter().all(|&b| b == 0xFF) {
                continue;
            }
            let mut data = [0xFF; PHRASE_LEN];
            data.copy_from_slice(chunk);
            let phrase_address = FLASH_DATA_START + (index * PHRASE_LEN) as u32;
            if let Err(e) = self.run(&SequencerCommand::program_phrase(phrase_address, data)) {
                // The sector is already erased; the region is now partial
                log_error!(
                    "flash reprogram failed at {:#x} after erase, region incomplete: {}",
                    phrase_address,
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Launch one sequencer command and wait for it to retire
    fn run(&mut self, command: &SequencerCommand) -> Result<(), StoreError> {
        self.sequencer.clear_status();
        self.sequencer.submit(command)?;

        let mut polls = 0;
        while !self.sequencer.is_complete() {
            polls += 1;
            if polls >= SEQUENCER_POLL_LIMIT {
                return Err(StoreError::SequencerTimeout);
            }
        }

        let status = self.sequencer.status();
        if status.contains(SequencerStatus::ACCESS_ERROR) {
            return Err(SequencerError::AccessError.into());
        }
        if status.contains(SequencerStatus::PROTECTION_VIOLATION) {
            return Err(SequencerError::ProtectionViolation.into());
        }
        Ok(())
    }
}

fn check_aligned(address: u32, alignment: u32) -> Result<(), StoreError> {
    if address % alignment != 0 {
        return Err(StoreError::Misaligned);
    }
    Ok(())
}

fn check_range(address: u32, len: usize) -> Result<(), StoreError> {
    let end = FLASH_DATA_START + FLASH_DATA_SIZE as u32;
    if address < FLASH_DATA_START || address.saturating_add(len as u32) > end {
        return Err(StoreError::OutOfRange);
    }
    Ok(())
}
