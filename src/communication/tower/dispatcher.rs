//! Command dispatcher
//!
//! Routes decoded frames to handlers keyed on the 7-bit command code (ack
//! bit masked off), executes the device action, and builds replies per the
//! acknowledgment convention: exactly one reply frame iff the request
//! carried the ack bit, with bit 7 of the reply set on success and cleared
//! on failure, parameters echoed or handler-updated.
//!
//! Handlers validate their own parameters and fail closed; an unknown code
//! is a failure, not a panic.

use crate::communication::tower::frame::{Frame, ACK_REQUEST};
use crate::log_warn;
use crate::parameters::{DeviceConfig, InitError};
use crate::platform::error::RtcError;
use crate::platform::traits::{FlashSequencer, RtcInterface};
use crate::storage::{NvStore, StoreError, FLASH_DATA_SIZE, FLASH_DATA_START};
use core::fmt;
use heapless::Vec;

/// Startup/status request
pub const CMD_STARTUP: u8 = 0x04;
/// Version query
pub const CMD_VERSION: u8 = 0x09;
/// Device number get/set
pub const CMD_DEVICE_NUMBER: u8 = 0x0B;
/// Device mode get/set
pub const CMD_DEVICE_MODE: u8 = 0x0D;
/// Program (or erase) one flash data byte
pub const CMD_PROGRAM_BYTE: u8 = 0x07;
/// Read one flash data byte
pub const CMD_READ_BYTE: u8 = 0x08;
/// Set the real-time clock
pub const CMD_SET_TIME: u8 = 0x0C;
/// Protocol mode get/set
pub const CMD_PROTOCOL_MODE: u8 = 0x0A;

/// Get/set selector values for parameterized commands
const PARAM_GET: u8 = 1;
const PARAM_SET: u8 = 2;

/// Program-byte offset that means "erase the sector" instead
const ERASE_OFFSET: u8 = 8;

/// Reported firmware version
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// Upper bound on frames one request can queue (ack + announcements)
pub const MAX_REPLY_FRAMES: usize = 4;

/// Handler failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// No handler for the command code
    Unknown,
    /// A parameter failed the handler's validation
    InvalidParameter,
    /// The non-volatile store rejected the operation
    Store(StoreError),
    /// The real-time clock rejected the operation
    Rtc(RtcError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown => write!(f, "unknown command"),
            CommandError::InvalidParameter => write!(f, "invalid parameter"),
            CommandError::Store(e) => write!(f, "store: {e}"),
            CommandError::Rtc(e) => write!(f, "rtc: {e}"),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        CommandError::Store(e)
    }
}

impl From<RtcError> for CommandError {
    fn from(e: RtcError) -> Self {
        CommandError::Rtc(e)
    }
}

/// Command dispatcher owning the device state handlers act on
pub struct CommandDispatcher<S: FlashSequencer, R: RtcInterface> {
    store: NvStore<S>,
    rtc: R,
    config: DeviceConfig,
    /// Protocol mode (0 or 1), RAM-resident
    protocol_mode: u8,
}

impl<S: FlashSequencer, R: RtcInterface> CommandDispatcher<S, R> {
    /// Initialize the device state and build a dispatcher
    ///
    /// Allocates and seeds the persistent configuration; failure here is
    /// fatal for the device.
    ///
    /// # Errors
    ///
    /// Propagates [`InitError`] from configuration startup.
    pub fn new(mut store: NvStore<S>, rtc: R) -> Result<Self, InitError> {
        let config = DeviceConfig::init(&mut store)?;
        Ok(Self {
            store,
            rtc,
            config,
            protocol_mode: 0,
        })
    }

    /// Access the variable store
    pub fn store(&self) -> &NvStore<S> {
        &self.store
    }

    /// Access the real-time clock
    pub fn rtc(&self) -> &R {
        &self.rtc
    }

    /// Frames the device announces after a successful startup
    ///
    /// The startup/status frame, the firmware version, and the device
    /// number, in that order.
    ///
    /// # Errors
    ///
    /// Fails when the device number cannot be read back.
    pub fn startup_frames(&self) -> Result<Vec<Frame, MAX_REPLY_FRAMES>, StoreError> {
        let number = self.config.number(&self.store)?;
        let [lo, hi] = number.to_le_bytes();

        let mut frames = Vec::new();
        // Three pushes into a MAX_REPLY_FRAMES-capacity vec cannot fail
        let _ = frames.push(Frame::new(CMD_STARTUP, 0, 0, 0));
        let _ = frames.push(Frame::new(CMD_VERSION, b'v', VERSION_MAJOR, VERSION_MINOR));
        let _ = frames.push(Frame::new(CMD_DEVICE_NUMBER, PARAM_GET, lo, hi));
        Ok(frames)
    }

    /// Dispatch one decoded frame and build the reply frames to send
    ///
    /// Returns an empty set when the ack bit was clear (protocol-mandated
    /// silence, success or not). With the ack bit set, the first frame is
    /// the acknowledgment; a startup request additionally queues the
    /// version and device-number announcements behind it.
    pub fn handle(&mut self, frame: Frame) -> Vec<Frame, MAX_REPLY_FRAMES> {
        let code = frame.command_code();
        let result = self.execute(code, frame.parameter1, frame.parameter2, frame.parameter3);

        if let Err(e) = &result {
            log_warn!("command {:#04x} failed: {}", code, e);
        }
        let mut replies = Vec::new();
        if !frame.ack_requested() {
            return replies;
        }

        match result {
            Ok((p1, p2, p3)) => {
                let _ = replies.push(Frame::new(code | ACK_REQUEST, p1, p2, p3));
                if code == CMD_STARTUP {
                    if let Ok(startup) = self.startup_frames() {
                        // Skip the startup frame itself, already acked above
                        for announcement in startup.iter().skip(1) {
                            let _ = replies.push(*announcement);
                        }
                    }
                }
            }
            Err(_) => {
                // Failure: echo the request with the ack bit cleared
                let _ = replies.push(Frame::new(
                    code,
                    frame.parameter1,
                    frame.parameter2,
                    frame.parameter3,
                ));
            }
        }
        replies
    }

    /// Execute one command, returning the reply parameters on success
    fn execute(&mut self, code: u8, p1: u8, p2: u8, p3: u8) -> Result<(u8, u8, u8), CommandError> {
        match code {
            CMD_STARTUP => {
                if p1 != 0 || p2 != 0 || p3 != 0 {
                    return Err(CommandError::InvalidParameter);
                }
                Ok((0, 0, 0))
            }
            CMD_VERSION => Ok((b'v', VERSION_MAJOR, VERSION_MINOR)),
            CMD_DEVICE_NUMBER => match p1 {
                PARAM_GET => {
                    let [lo, hi] = self.config.number(&self.store)?.to_le_bytes();
                    Ok((PARAM_GET, lo, hi))
                }
                PARAM_SET => {
                    self.config
                        .set_number(&mut self.store, u16::from_le_bytes([p2, p3]))?;
                    Ok((p1, p2, p3))
                }
                _ => Err(CommandError::InvalidParameter),
            },
            CMD_DEVICE_MODE => match p1 {
                PARAM_GET => {
                    let [lo, hi] = self.config.mode(&self.store)?.to_le_bytes();
                    Ok((PARAM_GET, lo, hi))
                }
                PARAM_SET => {
                    self.config
                        .set_mode(&mut self.store, u16::from_le_bytes([p2, p3]))?;
                    Ok((p1, p2, p3))
                }
                _ => Err(CommandError::InvalidParameter),
            },
            CMD_PROGRAM_BYTE => {
                if p1 > ERASE_OFFSET {
                    return Err(CommandError::InvalidParameter);
                }
                if p1 == ERASE_OFFSET {
                    self.store.erase()?;
                } else {
                    self.store.write8(FLASH_DATA_START + p1 as u32, p3)?;
                }
                Ok((p1, p2, p3))
            }
            CMD_READ_BYTE => {
                if p1 as usize >= FLASH_DATA_SIZE {
                    return Err(CommandError::InvalidParameter);
                }
                let data = self.store.read8(FLASH_DATA_START + p1 as u32)?;
                Ok((p1, 0, data))
            }
            CMD_SET_TIME => {
                if p1 > 23 || p2 > 59 || p3 > 59 {
                    return Err(CommandError::InvalidParameter);
                }
                self.rtc.set_time(p1, p2, p3)?;
                Ok((p1, p2, p3))
            }
            CMD_PROTOCOL_MODE => match p1 {
                PARAM_GET => Ok((PARAM_GET, self.protocol_mode, 0)),
                PARAM_SET => {
                    if p2 > 1 {
                        return Err(CommandError::InvalidParameter);
                    }
                    self.protocol_mode = p2;
                    Ok((p1, p2, p3))
                }
                _ => Err(CommandError::InvalidParameter),
            },
            _ => Err(CommandError::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{DEFAULT_DEVICE_MODE, DEFAULT_DEVICE_NUMBER};
    use crate::platform::mock::{MockRtc, MockSequencer};

    fn dispatcher() -> CommandDispatcher<MockSequencer, MockRtc> {
        let store = NvStore::new(MockSequencer::new());
        CommandDispatcher::new(store, MockRtc::new()).unwrap()
    }

    #[test]
    fn get_device_number_replies_stored_value() {
        // Fresh flash seeds the default number 0x0DA2
        let mut dispatcher = dispatcher();
        let replies = dispatcher.handle(Frame::new(0x8B, 1, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8B, 1, 0xA2, 0x0D)]);
    }

    #[test]
    fn set_device_number_persists() {
        let mut dispatcher = dispatcher();

        let replies = dispatcher.handle(Frame::new(0x8B, 2, 0x34, 0x12));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8B, 2, 0x34, 0x12)]);

        let replies = dispatcher.handle(Frame::new(0x8B, 1, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8B, 1, 0x34, 0x12)]);
    }

    #[test]
    fn get_device_mode_replies_default() {
        let mut dispatcher = dispatcher();
        let [lo, hi] = DEFAULT_DEVICE_MODE.to_le_bytes();
        let replies = dispatcher.handle(Frame::new(0x8D, 1, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8D, 1, lo, hi)]);
    }

    #[test]
    fn erase_command_erases_and_acks_success() {
        let mut dispatcher = dispatcher();
        let erases_before = dispatcher.store().sequencer().erase_count();

        let replies = dispatcher.handle(Frame::new(0x87, 8, 0, 0xFF));
        assert_eq!(replies.as_slice(), &[Frame::new(0x87, 8, 0, 0xFF)]);
        assert!(dispatcher.store().sequencer().erase_count() > erases_before);

        // The data region reads back erased afterwards
        let replies = dispatcher.handle(Frame::new(0x88, 0, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x88, 0, 0, 0xFF)]);
    }

    #[test]
    fn program_byte_round_trips_through_read_byte() {
        let mut dispatcher = dispatcher();

        // Program offset 6 (outside the configuration variables)
        let replies = dispatcher.handle(Frame::new(0x87, 6, 0, 0x5A));
        assert_eq!(replies.as_slice(), &[Frame::new(0x87, 6, 0, 0x5A)]);

        let replies = dispatcher.handle(Frame::new(0x88, 6, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x88, 6, 0, 0x5A)]);
    }

    #[test]
    fn no_reply_when_ack_bit_clear() {
        let mut dispatcher = dispatcher();
        assert!(dispatcher.handle(Frame::new(0x0B, 1, 0, 0)).is_empty());
        // Failures are equally silent
        assert!(dispatcher.handle(Frame::new(0x0B, 9, 0, 0)).is_empty());
        assert!(dispatcher.handle(Frame::new(0x7F, 0, 0, 0)).is_empty());
    }

    #[test]
    fn unknown_command_echoes_with_ack_cleared() {
        let mut dispatcher = dispatcher();
        let replies = dispatcher.handle(Frame::new(0xFF, 1, 2, 3));
        assert_eq!(replies.as_slice(), &[Frame::new(0x7F, 1, 2, 3)]);
    }

    #[test]
    fn invalid_parameters_fail_closed() {
        let mut dispatcher = dispatcher();

        // Hours out of range
        let replies = dispatcher.handle(Frame::new(0x8C, 24, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x0C, 24, 0, 0)]);

        // Program offset past the erase sentinel
        let replies = dispatcher.handle(Frame::new(0x87, 9, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x07, 9, 0, 0)]);

        // Bad get/set selector
        let replies = dispatcher.handle(Frame::new(0x8B, 3, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x0B, 3, 0, 0)]);
    }

    #[test]
    fn version_query_reports_firmware_version() {
        let mut dispatcher = dispatcher();
        let replies = dispatcher.handle(Frame::new(0x89, 0, 0, 0));
        assert_eq!(
            replies.as_slice(),
            &[Frame::new(0x89, b'v', VERSION_MAJOR, VERSION_MINOR)]
        );
    }

    #[test]
    fn set_time_reaches_the_clock() {
        let mut dispatcher = dispatcher();
        let replies = dispatcher.handle(Frame::new(0x8C, 12, 34, 56));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8C, 12, 34, 56)]);
        assert_eq!(dispatcher.rtc().time(), (12, 34, 56));
    }

    #[test]
    fn protocol_mode_get_and_set() {
        let mut dispatcher = dispatcher();

        let replies = dispatcher.handle(Frame::new(0x8A, 1, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8A, 1, 0, 0)]);

        let replies = dispatcher.handle(Frame::new(0x8A, 2, 1, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8A, 2, 1, 0)]);

        let replies = dispatcher.handle(Frame::new(0x8A, 1, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x8A, 1, 1, 0)]);

        // Mode values other than 0/1 are rejected
        let replies = dispatcher.handle(Frame::new(0x8A, 2, 2, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x0A, 2, 2, 0)]);
    }

    #[test]
    fn startup_request_queues_announcements() {
        let mut dispatcher = dispatcher();
        let [lo, hi] = DEFAULT_DEVICE_NUMBER.to_le_bytes();

        let replies = dispatcher.handle(Frame::new(0x84, 0, 0, 0));
        assert_eq!(
            replies.as_slice(),
            &[
                Frame::new(0x84, 0, 0, 0),
                Frame::new(0x09, b'v', VERSION_MAJOR, VERSION_MINOR),
                Frame::new(0x0B, 1, lo, hi),
            ]
        );
    }

    #[test]
    fn startup_frames_announce_identity() {
        let dispatcher = dispatcher();
        let [lo, hi] = DEFAULT_DEVICE_NUMBER.to_le_bytes();
        let frames = dispatcher.startup_frames().unwrap();
        assert_eq!(
            frames.as_slice(),
            &[
                Frame::new(0x04, 0, 0, 0),
                Frame::new(0x09, b'v', VERSION_MAJOR, VERSION_MINOR),
                Frame::new(0x0B, 1, lo, hi),
            ]
        );
    }

    #[test]
    fn startup_with_nonzero_parameters_is_rejected() {
        let mut dispatcher = dispatcher();
        let replies = dispatcher.handle(Frame::new(0x84, 1, 0, 0));
        assert_eq!(replies.as_slice(), &[Frame::new(0x04, 1, 0, 0)]);
    }
}
