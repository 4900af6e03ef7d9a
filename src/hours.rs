//! Restaurant business hours.
//!
//! The property runs on Peru time (UTC−5, no daylight saving), so hours are
//! evaluated against a fixed offset rather than the device's local zone.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

/// Offset of the property's local time from UTC, in seconds.
pub const PROPERTY_UTC_OFFSET_SECS: i32 = -5 * 60 * 60;

/// Default opening hour (inclusive).
pub const DEFAULT_OPEN_HOUR: u32 = 11;

/// Default closing hour (exclusive).
pub const DEFAULT_CLOSE_HOUR: u32 = 21;

/// Returns the property's fixed UTC offset.
pub fn property_offset() -> FixedOffset {
    FixedOffset::east_opt(PROPERTY_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Daily opening window of the restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open_hour: DEFAULT_OPEN_HOUR,
            close_hour: DEFAULT_CLOSE_HOUR,
        }
    }
}

impl BusinessHours {
    /// Returns `true` if the restaurant is open at `at`.
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        let hour = at.with_timezone(&property_offset()).hour();
        hour >= self.open_hour && hour < self.close_hour
    }

    /// Returns `true` if the restaurant is open right now.
    pub fn is_open_now(&self) -> bool {
        self.is_open_at(Utc::now())
    }
}
