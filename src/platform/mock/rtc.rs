//! Mock real-time clock for testing

use crate::platform::error::RtcError;
use crate::platform::traits::RtcInterface;

/// Mock real-time clock holding the time of day in memory
#[derive(Debug, Default)]
pub struct MockRtc {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl MockRtc {
    /// Create a new mock clock at 00:00:00
    pub fn new() -> Self {
        Self::default()
    }
}

impl RtcInterface for MockRtc {
    fn set_time(&mut self, hours: u8, minutes: u8, seconds: u8) -> Result<(), RtcError> {
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(RtcError::InvalidTime);
        }
        self.hours = hours;
        self.minutes = minutes;
        self.seconds = seconds;
        Ok(())
    }

    fn time(&self) -> (u8, u8, u8) {
        (self.hours, self.minutes, self.seconds)
    }
}
