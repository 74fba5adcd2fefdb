//! Tower serial control protocol
//!
//! Implements the device's half of the Tower point-to-point protocol: 5-byte
//! command frames over a byte-oriented link.
//!
//! # Architecture
//!
//! - **Frame**: one protocol unit (command + 3 parameters + XOR checksum)
//! - **BytePipe**: bounded ring buffer between interrupt-driven transport and
//!   the protocol layer
//! - **PacketCodec**: byte-stream framing with sliding-window resync
//! - **PacketChannel**: awaitable pipes plus a send lock for the threaded
//!   regime
//! - **CommandDispatcher**: routes decoded frames to handlers and builds
//!   replies
//! - **TowerLink**: per-transport context owning pipes and codec state
//!
//! # Wire format
//!
//! ```text
//! [command(1)] [param1(1)] [param2(1)] [param3(1)] [checksum(1)]
//! checksum = command ^ param1 ^ param2 ^ param3
//! ```
//!
//! Bit 7 of the command byte requests an acknowledgment reply.

pub mod channel; // Awaitable pipes for the threaded regime
pub mod codec; // Framing state machine with resync
pub mod dispatcher; // Command routing and handlers
pub mod frame; // Frame type and checksum rules
pub mod link; // Per-transport context
pub mod pipe; // Bounded byte ring buffer

pub use channel::{AsyncBytePipe, PacketChannel};
pub use codec::{DecodeState, PacketCodec};
pub use dispatcher::{CommandDispatcher, CommandError};
pub use frame::{Frame, ACK_REQUEST, FRAME_LEN};
pub use link::TowerLink;
pub use pipe::{BytePipe, PipeError, PIPE_CAPACITY};
