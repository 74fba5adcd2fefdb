//! Real-time clock interface trait

use crate::platform::error::RtcError;

/// Real-time clock interface
///
/// The dispatcher validates time fields before calling `set_time`, but
/// implementations must still reject out-of-range values since the trait
/// is public API.
pub trait RtcInterface {
    /// Set the time of day
    ///
    /// # Errors
    ///
    /// Returns `RtcError::InvalidTime` if hours > 23 or minutes/seconds > 59.
    fn set_time(&mut self, hours: u8, minutes: u8, seconds: u8) -> Result<(), RtcError>;

    /// Read the current time of day as (hours, minutes, seconds)
    fn time(&self) -> (u8, u8, u8);
}
