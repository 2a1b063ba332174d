//! Wall clock helpers
//!
//! Telemetry only carries the time of day, but board clocks usually expose a
//! broken-down calendar date (RTC registers), so the conversion to Unix time
//! lives here too. Calendar math uses Howard Hinnant's days_from_civil
//! algorithm: O(1), correct for every proleptic Gregorian date.
//! Reference: http://howardhinnant.github.io/date_algorithms.html

use core::fmt;

const SECONDS_PER_DAY: i64 = 86_400;

/// Hour, minute and second of a wall clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Build from components; `None` if any is out of range
    pub const fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            second,
        })
    }

    /// Time of day of `unix_secs` shifted by `utc_offset_secs`
    ///
    /// Offsets wrap across midnight in both directions.
    pub fn from_unix(unix_secs: u64, utc_offset_secs: i32) -> Self {
        let local = (unix_secs % SECONDS_PER_DAY as u64) as i64 + utc_offset_secs as i64;
        let secs_today = local.rem_euclid(SECONDS_PER_DAY);

        Self {
            hour: (secs_today / 3600) as u8,
            minute: ((secs_today % 3600) / 60) as u8,
            second: (secs_today % 60) as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Convert civil date (year, month, day) to days since Unix epoch
pub fn days_from_civil(year: u16, month: u8, day: u8) -> i32 {
    let y = year as i32;
    let m = month as i32;
    let d = day as i32;

    // March = month 0, February = month 11, so the leap day ends the year
    let (y, m) = if m <= 2 { (y - 1, m + 9) } else { (y, m - 3) };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32; // year of era [0, 399]
    let doy = (153 * (m as u32) + 2) / 5 + (d as u32) - 1; // day of year [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era [0, 146096]

    era * 146097 + (doe as i32) - 719468 // 719468 = days from 0000-03-01 to 1970-01-01
}

/// Convert days since Unix epoch to civil date (year, month, day)
///
/// Inverse of [`days_from_civil`]; years past 65535 saturate.
pub fn civil_from_days(days_since_epoch: i32) -> (u16, u8, u8) {
    // Shift epoch from 1970-01-01 to 0000-03-01
    let z = days_since_epoch + 719468;

    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era [0, 399]
    let y = (yoe as i32) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year [0, 365]
    let mp = (5 * doy + 2) / 153; // month [0, 11], 0 = March
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = if m <= 2 { y + 1 } else { y };

    (year.clamp(0, u16::MAX as i32) as u16, m, d)
}

/// Broken-down UTC date and time, as held by calendar RTCs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilDateTime {
    /// Calendar date and time of `unix_secs` (UTC)
    pub fn from_unix(unix_secs: u64) -> Self {
        let days = (unix_secs / SECONDS_PER_DAY as u64) as i32;
        let (year, month, day) = civil_from_days(days);
        let t = TimeOfDay::from_unix(unix_secs, 0);

        Self {
            year,
            month,
            day,
            hour: t.hour,
            minute: t.minute,
            second: t.second,
        }
    }

    /// Unix seconds of this date and time; dates before the epoch clamp to 0
    pub fn to_unix(&self) -> u64 {
        let days = days_from_civil(self.year, self.month, self.day) as i64;
        let secs = days * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64;
        secs.max(0) as u64
    }
}
