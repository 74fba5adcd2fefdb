//! UART interface trait
//!
//! Byte-oriented transport between the device and the host. The protocol
//! layer never touches the peripheral directly; interrupt-side code moves
//! bytes between the UART and the link's byte pipes.

use crate::platform::error::UartError;

/// UART interface trait
///
/// # Safety Invariants
///
/// - UART peripheral must be initialized before use
/// - Only one owner per UART peripheral instance
pub trait UartInterface {
    /// Write data to the UART
    ///
    /// Returns the number of bytes accepted for transmission.
    ///
    /// # Errors
    ///
    /// Returns `UartError::WriteFailed` if the write operation fails.
    fn write(&mut self, data: &[u8]) -> Result<usize, UartError>;

    /// Read data from the UART
    ///
    /// Reads up to `buffer.len()` bytes into the provided buffer and returns
    /// the number of bytes actually read. Never blocks; returns 0 when no
    /// data is pending.
    ///
    /// # Errors
    ///
    /// Returns `UartError::ReadFailed` if the read operation fails.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, UartError>;

    /// Check if data is available to read
    ///
    /// Returns `true` if at least one byte can be read without blocking.
    fn available(&self) -> bool;
}
