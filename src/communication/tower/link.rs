//! Per-transport link context
//!
//! One `TowerLink` owns the receive pipe, transmit pipe and decoder state
//! for a single physical transport. Nothing is process-global: several links
//! can run side by side, and tests exercise a link in isolation.
//!
//! Two call sites share a link without locking, the polled regime's
//! single-producer/single-consumer rule:
//! - interrupt-side code calls [`TowerLink::feed_rx_byte`] and
//!   [`TowerLink::take_tx_byte`], never blocking
//! - protocol-side code calls [`TowerLink::poll_frame`] and
//!   [`TowerLink::send_frame`]
//!
//! [`TowerLink::service`] drives a full cycle against a UART and a
//! dispatcher for cooperative main loops.

use crate::communication::tower::codec::PacketCodec;
use crate::communication::tower::dispatcher::CommandDispatcher;
use crate::communication::tower::frame::Frame;
use crate::communication::tower::pipe::{BytePipe, PipeError};
use crate::error::TowerError;
use crate::platform::traits::{FlashSequencer, RtcInterface, UartInterface};

/// Transport context: pipes plus decoder state for one link
pub struct TowerLink {
    rx: BytePipe,
    tx: BytePipe,
    codec: PacketCodec,
}

impl TowerLink {
    /// Create a link with empty pipes and a reset decoder
    pub const fn new() -> Self {
        Self {
            rx: BytePipe::new(),
            tx: BytePipe::new(),
            codec: PacketCodec::new(),
        }
    }

    /// Push one received byte into the link (interrupt side)
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Full` when the receive pipe is at capacity; the
    /// byte is dropped by the caller's choice, not silently.
    pub fn feed_rx_byte(&mut self, byte: u8) -> Result<(), PipeError> {
        self.rx.put(byte)
    }

    /// Pop the next byte awaiting transmission (interrupt side)
    pub fn take_tx_byte(&mut self) -> Option<u8> {
        self.tx.get().ok()
    }

    /// Drain received bytes through the decoder until a frame completes
    ///
    /// Returns `None` when the receive pipe empties mid-frame; decoder state
    /// carries over to the next call.
    pub fn poll_frame(&mut self) -> Option<Frame> {
        self.codec.poll(&mut self.rx)
    }

    /// Queue one frame for transmission
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Full` when the transmit pipe lacks space for the
    /// whole frame; nothing is queued in that case.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), PipeError> {
        PacketCodec::encode(frame, &mut self.tx)
    }

    /// Move bytes between the UART and the pipes
    ///
    /// Receive direction stops at pipe capacity, leaving backpressure in
    /// the UART; transmit direction drains the pipe completely.
    ///
    /// # Errors
    ///
    /// Propagates UART read/write failures.
    pub fn pump<U: UartInterface>(&mut self, uart: &mut U) -> Result<(), crate::platform::error::UartError> {
        while uart.available() && !self.rx.is_full() {
            let mut byte = [0u8; 1];
            if uart.read(&mut byte)? == 0 {
                break;
            }
            if self.rx.put(byte[0]).is_err() {
                break;
            }
        }

        while let Ok(byte) = self.tx.get() {
            uart.write(&[byte])?;
        }
        Ok(())
    }

    /// Run one full service cycle: pump, decode, dispatch, reply
    ///
    /// Returns the number of frames dispatched this cycle.
    ///
    /// # Errors
    ///
    /// Surfaces UART failures and reply-queue overflow; decode-level
    /// corruption is recovered internally and never reported here.
    pub fn service<U, S, R>(
        &mut self,
        uart: &mut U,
        dispatcher: &mut CommandDispatcher<S, R>,
    ) -> Result<usize, TowerError>
    where
        U: UartInterface,
        S: FlashSequencer,
        R: RtcInterface,
    {
        self.pump(uart)?;

        let mut dispatched = 0;
        while let Some(frame) = self.poll_frame() {
            dispatched += 1;
            for reply in dispatcher.handle(frame) {
                self.send_frame(&reply)?;
            }
        }

        self.pump(uart)?;
        Ok(dispatched)
    }
}

impl Default for TowerLink {
    fn default() -> Self {
        Self::new()
    }
}
