//! Platform error types
//!
//! This module defines error types for peripheral operations. Each trait in
//! [`crate::platform::traits`] reports failures with its own focused enum;
//! higher layers wrap these where they need more context.

use core::fmt;

/// Flash command sequencer errors
///
/// Raised when the hardware sequencer rejects or fails a command. Both
/// variants are detected *after* the command has launched, so for a program
/// or erase command the target sector may already have been altered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    /// Flash access error flag (ACCERR) was set after completion
    AccessError,
    /// Flash protection violation flag (FPVIOL) was set after completion
    ProtectionViolation,
    /// Command or read addressed memory outside the device's flash
    InvalidAddress,
}

/// UART transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    /// Write operation failed
    WriteFailed,
    /// Read operation failed
    ReadFailed,
    /// Receiver overrun
    Overrun,
}

/// Real-time clock errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcError {
    /// Time fields out of range (hours > 23, minutes/seconds > 59)
    InvalidTime,
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerError::AccessError => write!(f, "flash access error"),
            SequencerError::ProtectionViolation => write!(f, "flash protection violation"),
            SequencerError::InvalidAddress => write!(f, "address outside flash"),
        }
    }
}

impl fmt::Display for UartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UartError::WriteFailed => write!(f, "UART write failed"),
            UartError::ReadFailed => write!(f, "UART read failed"),
            UartError::Overrun => write!(f, "UART receiver overrun"),
        }
    }
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtcError::InvalidTime => write!(f, "time fields out of range"),
        }
    }
}
