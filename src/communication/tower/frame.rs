//! Tower protocol frame
//!
//! One protocol unit: a command byte (7 data bits plus an ack-request bit),
//! three parameter bytes, and an XOR checksum over all four.

/// Frame length on the wire, in bytes
pub const FRAME_LEN: usize = 5;

/// Acknowledgment-request flag, bit 7 of the command byte
pub const ACK_REQUEST: u8 = 0x80;

/// One decoded protocol frame
///
/// The checksum is not stored; it is recomputed on demand from the other
/// four bytes. A frame assembled by the codec is valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Command byte, including the ack-request bit
    pub command: u8,
    /// First parameter byte
    pub parameter1: u8,
    /// Second parameter byte
    pub parameter2: u8,
    /// Third parameter byte
    pub parameter3: u8,
}

impl Frame {
    /// Create a frame from its four payload bytes
    pub const fn new(command: u8, parameter1: u8, parameter2: u8, parameter3: u8) -> Self {
        Self {
            command,
            parameter1,
            parameter2,
            parameter3,
        }
    }

    /// XOR checksum over command and parameters
    ///
    /// The full command byte participates, ack bit included.
    pub const fn checksum(&self) -> u8 {
        self.command ^ self.parameter1 ^ self.parameter2 ^ self.parameter3
    }

    /// Whether the sender requested an acknowledgment reply
    pub const fn ack_requested(&self) -> bool {
        self.command & ACK_REQUEST != 0
    }

    /// Command code with the ack-request bit masked off
    pub const fn command_code(&self) -> u8 {
        self.command & !ACK_REQUEST
    }

    /// Wire representation: payload bytes followed by the checksum
    pub const fn to_bytes(&self) -> [u8; FRAME_LEN] {
        [
            self.command,
            self.parameter1,
            self.parameter2,
            self.parameter3,
            self.checksum(),
        ]
    }
}
