//! Awaitable byte pipes and packet channel for the threaded regime
//!
//! In the threaded regime multiple preemptible tasks call `put`/`get`/send
//! concurrently, so the pipe operations become suspension points: a producer
//! waits for space, a consumer waits for items, and the index mutation is
//! guarded internally. [`AsyncBytePipe`] builds this on
//! `embassy_sync::channel::Channel`, whose wait/wake discipline is exactly
//! the counting "space"/"items" pair plus index lock the protocol requires.
//!
//! Interrupt handlers never call the awaiting forms; they use
//! [`AsyncBytePipe::try_put`]/[`AsyncBytePipe::try_get`] and return
//! immediately, while dedicated tasks per direction do the waiting.
//!
//! [`PacketChannel`] adds the framing codec plus a per-transport send lock so
//! packets from different tasks are never interleaved byte-for-byte.

use super::codec::PacketCodec;
use super::frame::Frame;
use super::pipe::PipeError;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;

/// Bounded byte pipe with awaitable put/get
///
/// `N` is the capacity in bytes. FIFO ordering is preserved; capacity
/// violations either suspend the caller (awaiting forms) or are reported
/// (try forms), never swallowed.
pub struct AsyncBytePipe<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, u8, N>,
}

impl<const N: usize> AsyncBytePipe<N> {
    /// Create an empty pipe
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Insert a byte, suspending the calling task until space exists
    pub async fn put(&self, byte: u8) {
        self.channel.send(byte).await;
    }

    /// Remove the oldest byte, suspending until one is available
    pub async fn get(&self) -> u8 {
        self.channel.receive().await
    }

    /// Non-suspending insert for interrupt context
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Full` when the pipe is at capacity.
    pub fn try_put(&self, byte: u8) -> Result<(), PipeError> {
        self.channel.try_send(byte).map_err(|_| PipeError::Full)
    }

    /// Non-suspending removal for interrupt context
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Empty` when no bytes are held.
    pub fn try_get(&self) -> Result<u8, PipeError> {
        self.channel.try_receive().map_err(|_| PipeError::Empty)
    }
}

impl<const N: usize> Default for AsyncBytePipe<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame-level channel over a pair of awaitable byte pipes
///
/// Owns the receive-direction decoder and the transmit-direction send lock.
/// `recv` may be called from one task while any number of tasks call `send`.
pub struct PacketChannel<const N: usize> {
    rx: AsyncBytePipe<N>,
    tx: AsyncBytePipe<N>,
    decoder: Mutex<CriticalSectionRawMutex, PacketCodec>,
    send_lock: Mutex<CriticalSectionRawMutex, ()>,
}

impl<const N: usize> PacketChannel<N> {
    /// Create a channel with empty pipes and a fresh decoder
    pub const fn new() -> Self {
        Self {
            rx: AsyncBytePipe::new(),
            tx: AsyncBytePipe::new(),
            decoder: Mutex::new(PacketCodec::new()),
            send_lock: Mutex::new(()),
        }
    }

    /// Receive-direction pipe (interrupt side feeds it with `try_put`)
    pub fn rx(&self) -> &AsyncBytePipe<N> {
        &self.rx
    }

    /// Transmit-direction pipe (interrupt side drains it with `try_get`)
    pub fn tx(&self) -> &AsyncBytePipe<N> {
        &self.tx
    }

    /// Await the next complete frame
    ///
    /// Suspends while the receive pipe is empty; checksum mismatches are
    /// recovered internally by the decoder's sliding-window resync and never
    /// surface to the caller.
    pub async fn recv(&self) -> Frame {
        let mut decoder = self.decoder.lock().await;
        loop {
            let byte = self.rx.get().await;
            if let Some(frame) = decoder.advance(byte) {
                return frame;
            }
        }
    }

    /// Emit one frame, suspending while the transmit pipe is full
    ///
    /// The whole 5-byte emission holds the send lock, so frames from
    /// concurrent senders are never interleaved.
    pub async fn send(&self, frame: &Frame) {
        let _in_flight = self.send_lock.lock().await;
        for byte in frame.to_bytes() {
            self.tx.put(byte).await;
        }
    }
}

impl<const N: usize> Default for PacketChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}
