//! Packet framing codec
//!
//! Turns a raw byte stream into discrete 5-byte frames and back. The decoder
//! is a five-state machine consuming one byte per transition; checksum
//! mismatches trigger a one-byte sliding-window resync rather than a full
//! restart, so a corrupted or out-of-phase stream recovers without the host
//! resending whole frames.
//!
//! # Resynchronization
//!
//! On a checksum mismatch the window shifts left by one byte
//! (`command ← p1; p1 ← p2; p2 ← p3; p3 ← checksum`) and the decoder stays
//! in [`DecodeState::AwaitChecksum`], testing the shifted window against the
//! next byte. Every byte boundary is a candidate frame start; the cost is
//! re-testing already-seen bytes, never losing them.

use super::frame::{Frame, FRAME_LEN};
use super::pipe::{BytePipe, PipeError};

/// Decoder position within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for a command byte
    AwaitCommand,
    /// Waiting for the first parameter
    AwaitP1,
    /// Waiting for the second parameter
    AwaitP2,
    /// Waiting for the third parameter
    AwaitP3,
    /// Waiting for the checksum byte
    AwaitChecksum,
}

/// Framing state machine
///
/// Holds the partially assembled frame between calls; if no byte is
/// available the decoder keeps its state and reports "no frame yet".
pub struct PacketCodec {
    state: DecodeState,
    command: u8,
    parameter1: u8,
    parameter2: u8,
    parameter3: u8,
}

impl PacketCodec {
    /// Create a codec awaiting the first command byte
    pub const fn new() -> Self {
        Self {
            state: DecodeState::AwaitCommand,
            command: 0,
            parameter1: 0,
            parameter2: 0,
            parameter3: 0,
        }
    }

    /// Current decoder state
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Feed one received byte to the decoder
    ///
    /// Returns a completed frame when `byte` is a checksum matching the
    /// assembled window; otherwise advances (or shifts) the window and
    /// returns `None`.
    pub fn advance(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DecodeState::AwaitCommand => {
                self.command = byte;
                self.state = DecodeState::AwaitP1;
                None
            }
            DecodeState::AwaitP1 => {
                self.parameter1 = byte;
                self.state = DecodeState::AwaitP2;
                None
            }
            DecodeState::AwaitP2 => {
                self.parameter2 = byte;
                self.state = DecodeState::AwaitP3;
                None
            }
            DecodeState::AwaitP3 => {
                self.parameter3 = byte;
                self.state = DecodeState::AwaitChecksum;
                None
            }
            DecodeState::AwaitChecksum => {
                let frame = Frame::new(
                    self.command,
                    self.parameter1,
                    self.parameter2,
                    self.parameter3,
                );
                if frame.checksum() == byte {
                    self.state = DecodeState::AwaitCommand;
                    return Some(frame);
                }
                // Sliding-window resync: shift one byte, keep testing here
                self.command = self.parameter1;
                self.parameter1 = self.parameter2;
                self.parameter2 = self.parameter3;
                self.parameter3 = byte;
                None
            }
        }
    }

    /// Drain bytes from `rx` until a frame completes or the pipe empties
    ///
    /// Returns `None` when the pipe runs dry mid-frame; the decoder state is
    /// preserved for the next call.
    pub fn poll(&mut self, rx: &mut BytePipe) -> Option<Frame> {
        while let Ok(byte) = rx.get() {
            if let Some(frame) = self.advance(byte) {
                return Some(frame);
            }
        }
        None
    }

    /// Serialize a frame into the transmit pipe
    ///
    /// Emits command, parameters and checksum in wire order. Capacity is
    /// checked up front so a frame is never half-emitted.
    ///
    /// # Errors
    ///
    /// Returns `PipeError::Full` when fewer than [`FRAME_LEN`] bytes of
    /// space remain; the pipe is left untouched.
    pub fn encode(frame: &Frame, tx: &mut BytePipe) -> Result<(), PipeError> {
        if tx.remaining() < FRAME_LEN {
            return Err(PipeError::Full);
        }
        for byte in frame.to_bytes() {
            tx.put(byte)?;
        }
        Ok(())
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(codec: &mut PacketCodec, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if let Some(frame) = codec.advance(byte) {
                frames.push(frame);
            }
        }
        frames
    }

    #[test]
    fn valid_frame_decodes_and_resets_state() {
        let payloads = [
            (0x04u8, 0x00u8, 0x00u8, 0x00u8),
            (0x09, b'v', 1, 0),
            (0x8B, 1, 0xA2, 0x0D),
            (0xFF, 0xFF, 0xFF, 0xFF),
            (0x00, 0x00, 0x00, 0x00),
        ];
        for (c, p1, p2, p3) in payloads {
            let mut codec = PacketCodec::new();
            let expected = Frame::new(c, p1, p2, p3);
            let frames = feed(&mut codec, &expected.to_bytes());
            assert_eq!(frames, vec![expected]);
            assert_eq!(codec.state(), DecodeState::AwaitCommand);
        }
    }

    #[test]
    fn corrupted_prefix_shifts_until_aligned() {
        // One garbage byte, then a valid frame: the decoder must emit
        // exactly the trailing frame after one shift iteration.
        let valid = Frame::new(0x09, b'v', 1, 0);
        let mut stream = vec![0x55];
        stream.extend_from_slice(&valid.to_bytes());

        let mut codec = PacketCodec::new();
        let frames = feed(&mut codec, &stream);
        assert_eq!(frames, vec![valid]);
        assert_eq!(codec.state(), DecodeState::AwaitCommand);
    }

    #[test]
    fn shift_count_matches_corruption_offset() {
        // k garbage bytes cost exactly k extra input bytes before the
        // trailing frame aligns; nothing is discarded outright.
        for k in 1..=4usize {
            let valid = Frame::new(0x0B, 1, 0, 0);
            let mut stream = vec![0xEEu8; k];
            stream.extend_from_slice(&valid.to_bytes());

            let mut codec = PacketCodec::new();
            let mut emitted = Vec::new();
            let mut consumed_at = None;
            for (i, &byte) in stream.iter().enumerate() {
                if let Some(frame) = codec.advance(byte) {
                    emitted.push(frame);
                    consumed_at = Some(i);
                }
            }
            assert_eq!(emitted, vec![valid], "k = {k}");
            // Frame completes exactly at the last byte of the stream
            assert_eq!(consumed_at, Some(stream.len() - 1), "k = {k}");
        }
    }

    #[test]
    fn poll_holds_state_across_empty_pipe() {
        let mut codec = PacketCodec::new();
        let mut rx = BytePipe::new();
        let frame = Frame::new(0x0D, 1, 0, 0);
        let bytes = frame.to_bytes();

        // First half of the frame, then the pipe runs dry
        for &byte in &bytes[..3] {
            rx.put(byte).unwrap();
        }
        assert_eq!(codec.poll(&mut rx), None);
        assert_eq!(codec.state(), DecodeState::AwaitP3);

        // Remaining bytes arrive later
        for &byte in &bytes[3..] {
            rx.put(byte).unwrap();
        }
        assert_eq!(codec.poll(&mut rx), Some(frame));
    }

    #[test]
    fn encode_emits_wire_order() {
        let mut tx = BytePipe::new();
        let frame = Frame::new(0x09, b'v', 1, 0);
        PacketCodec::encode(&frame, &mut tx).unwrap();

        let mut bytes = Vec::new();
        while let Ok(byte) = tx.get() {
            bytes.push(byte);
        }
        assert_eq!(bytes, frame.to_bytes().to_vec());
    }

    #[test]
    fn encode_refuses_partial_emission() {
        let mut tx = BytePipe::new();
        // Leave only 3 bytes of space
        for _ in 0..(crate::communication::tower::pipe::PIPE_CAPACITY - 3) {
            tx.put(0).unwrap();
        }
        let frame = Frame::new(0x04, 0, 0, 0);
        assert_eq!(PacketCodec::encode(&frame, &mut tx), Err(PipeError::Full));
        // No partial frame was written
        assert_eq!(tx.remaining(), 3);
    }

    #[test]
    fn back_to_back_frames_decode_independently() {
        let first = Frame::new(0x04, 0, 0, 0);
        let second = Frame::new(0x09, b'v', 1, 0);
        let mut stream = Vec::new();
        stream.extend_from_slice(&first.to_bytes());
        stream.extend_from_slice(&second.to_bytes());

        let mut codec = PacketCodec::new();
        assert_eq!(feed(&mut codec, &stream), vec![first, second]);
    }
}
