//! Bounded byte pipe
//!
//! A fixed-capacity circular buffer of bytes connecting asynchronous byte I/O
//! (interrupt handlers) to the synchronous protocol logic. Strict FIFO; the
//! only failure mode is a capacity violation, which is always reported to the
//! caller and never swallowed.
//!
//! This non-blocking form is safe with exactly one producer and one consumer
//! context (e.g. an interrupt handler filling it, a single task draining it).
//! When several threads share a pipe, use
//! [`AsyncBytePipe`](crate::communication::tower::channel::AsyncBytePipe),
//! which adds the suspension and mutual-exclusion discipline.

use core::fmt;

/// Pipe capacity in bytes
pub const PIPE_CAPACITY: usize = 256;

/// Capacity violations, the pipe's only failure mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeError {
    /// `put` on a pipe holding `PIPE_CAPACITY` bytes
    Full,
    /// `get` on an empty pipe
    Empty,
}

impl fmt::Display for PipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeError::Full => write!(f, "pipe full"),
            PipeError::Empty => write!(f, "pipe empty"),
        }
    }
}

/// Fixed-capacity FIFO byte buffer
pub struct BytePipe {
    buffer: [u8; PIPE_CAPACITY],
    /// Index of the oldest byte
    start: usize,
    /// Index one past the newest byte
    end: usize,
    /// Number of bytes currently held; `0 ≤ count ≤ PIPE_CAPACITY`
    count: usize,
}

impl BytePipe {
    /// Create an empty pipe
    pub const fn new() -> Self {
        Self {
            buffer: [0; PIPE_CAPACITY],
            start: 0,
            end: 0,
            count: 0,
        }
    }

    /// Insert a byte at the tail
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Full` when the pipe already holds
    /// `PIPE_CAPACITY` bytes; the byte is not inserted.
    pub fn put(&mut self, byte: u8) -> Result<(), PipeError> {
        if self.count == PIPE_CAPACITY {
            return Err(PipeError::Full);
        }
        self.buffer[self.end] = byte;
        self.end = (self.end + 1) % PIPE_CAPACITY;
        self.count += 1;
        Ok(())
    }

    /// Remove the oldest byte
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Empty` when no bytes are held.
    pub fn get(&mut self) -> Result<u8, PipeError> {
        if self.count == 0 {
            return Err(PipeError::Empty);
        }
        let byte = self.buffer[self.start];
        self.start = (self.start + 1) % PIPE_CAPACITY;
        self.count -= 1;
        Ok(byte)
    }

    /// Number of bytes currently held
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the pipe holds no bytes
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the pipe is at capacity
    pub fn is_full(&self) -> bool {
        self.count == PIPE_CAPACITY
    }

    /// Free space remaining, in bytes
    pub fn remaining(&self) -> usize {
        PIPE_CAPACITY - self.count
    }
}

impl Default for BytePipe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let mut pipe = BytePipe::new();
        for byte in 0..=200u8 {
            pipe.put(byte).unwrap();
        }
        for expected in 0..=200u8 {
            assert_eq!(pipe.get().unwrap(), expected);
        }
        assert!(pipe.is_empty());
    }

    #[test]
    fn get_on_empty_fails() {
        let mut pipe = BytePipe::new();
        assert_eq!(pipe.get(), Err(PipeError::Empty));
    }

    #[test]
    fn put_on_full_fails_without_dropping() {
        let mut pipe = BytePipe::new();
        for byte in 0..PIPE_CAPACITY {
            pipe.put(byte as u8).unwrap();
        }
        assert!(pipe.is_full());
        assert_eq!(pipe.put(0xAA), Err(PipeError::Full));

        // Contents are untouched by the failed put
        assert_eq!(pipe.len(), PIPE_CAPACITY);
        assert_eq!(pipe.get().unwrap(), 0);
    }

    #[test]
    fn indices_wrap_around() {
        let mut pipe = BytePipe::new();
        // Drive the indices past the end of the buffer several times
        for round in 0..4 {
            for i in 0..200u8 {
                pipe.put(i.wrapping_add(round)).unwrap();
            }
            for i in 0..200u8 {
                assert_eq!(pipe.get().unwrap(), i.wrapping_add(round));
            }
        }
        assert!(pipe.is_empty());
    }

    #[test]
    fn remaining_tracks_free_space() {
        let mut pipe = BytePipe::new();
        assert_eq!(pipe.remaining(), PIPE_CAPACITY);
        pipe.put(1).unwrap();
        pipe.put(2).unwrap();
        assert_eq!(pipe.remaining(), PIPE_CAPACITY - 2);
        pipe.get().unwrap();
        assert_eq!(pipe.remaining(), PIPE_CAPACITY - 1);
    }
}
