//! Mock peripheral implementations for testing
//!
//! In-memory stand-ins for the flash command sequencer, the UART transport,
//! and the real-time clock. All mocks are `no_std`-safe so they can also back
//! host-side tools built against this crate.

pub mod rtc;
pub mod sequencer;
pub mod uart;

pub use rtc::MockRtc;
pub use sequencer::MockSequencer;
pub use uart::MockUart;
