//! Mock UART implementation for testing
//!
//! Provides in-memory buffers for transmit and receive data, allowing unit
//! tests to verify protocol traffic without hardware.
//!
//! # Example
//!
//! ```
//! use tower_link::platform::mock::MockUart;
//! use tower_link::platform::traits::UartInterface;
//!
//! let mut uart = MockUart::new();
//!
//! uart.write(b"Hello").unwrap();
//! assert_eq!(uart.tx_data(), b"Hello");
//!
//! uart.inject_rx_data(b"World");
//! let mut buf = [0u8; 5];
//! uart.read(&mut buf).unwrap();
//! assert_eq!(&buf, b"World");
//! ```

use crate::platform::error::UartError;
use crate::platform::traits::UartInterface;
use heapless::{Deque, Vec};

/// Mock buffer depth, generous enough for any test scenario
const BUFFER_DEPTH: usize = 1024;

/// Mock UART implementation
#[derive(Debug, Default)]
pub struct MockUart {
    rx_buffer: Deque<u8, BUFFER_DEPTH>,
    tx_buffer: Vec<u8, BUFFER_DEPTH>,
}

impl MockUart {
    /// Create a new mock UART with empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject receive data (for test setup)
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        for &byte in data {
            // Test setup error, not a runtime condition
            if self.rx_buffer.push_back(byte).is_err() {
                panic!("mock UART receive buffer exhausted");
            }
        }
    }

    /// Get transmitted data (for test verification)
    pub fn tx_data(&self) -> &[u8] {
        &self.tx_buffer
    }

    /// Clear the transmit capture buffer
    pub fn clear_tx_data(&mut self) {
        self.tx_buffer.clear();
    }
}

impl UartInterface for MockUart {
    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        self.tx_buffer
            .extend_from_slice(data)
            .map_err(|_| UartError::WriteFailed)?;
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, UartError> {
        let mut count = 0;
        for slot in buffer.iter_mut() {
            match self.rx_buffer.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn available(&self) -> bool {
        !self.rx_buffer.is_empty()
    }
}
