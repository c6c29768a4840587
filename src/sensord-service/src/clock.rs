//! Wall-clock access for file naming and row timestamps.

use core::fmt;

/// Source of the current local date and time.
pub trait WallClock: Send + Sync {
    /// Returns the current date and time, or `None` if the clock is not set.
    fn now(&self) -> Option<CalendarTime>;
}

/// A broken-down date and time, without time zone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    /// Year, e.g. 2024.
    pub year: u16,
    /// Month, 1..=12.
    pub month: u8,
    /// Day of month, 1..=31.
    pub day: u8,
    /// Hour, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=59.
    pub second: u8,
}

impl CalendarTime {
    /// Converts seconds since 1970-01-01 00:00:00 into calendar form.
    ///
    /// Years past 65535 saturate.
    ///
    /// ```
    /// # use sensord_service::CalendarTime;
    /// let t = CalendarTime::from_unix_secs(1_709_210_096);
    /// assert_eq!((t.year, t.month, t.day), (2024, 2, 29));
    /// assert_eq!((t.hour, t.minute, t.second), (12, 34, 56));
    /// ```
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn from_unix_secs(secs: u64) -> Self {
        const SECONDS_PER_DAY: u64 = 86_400;

        let days = secs / SECONDS_PER_DAY;
        let secs_today = secs % SECONDS_PER_DAY;
        let (year, month, day) = civil_from_days(days);

        Self {
            year: if year > u16::MAX as u64 {
                u16::MAX
            } else {
                year as u16
            },
            month,
            day,
            hour: (secs_today / 3600) as u8,
            minute: ((secs_today % 3600) / 60) as u8,
            second: (secs_today % 60) as u8,
        }
    }

    /// Returns a [`Display`](fmt::Display) adapter rendering `YYYYMMDD_HHMMSS`, for use in
    /// file names.
    #[must_use]
    pub const fn compact(&self) -> Compact<'_> {
        Compact(self)
    }
}

/// Renders `YYYY-MM-DD HH:MM:SS`.
impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// See [`CalendarTime::compact()`].
#[derive(Debug)]
pub struct Compact<'a>(&'a CalendarTime);

impl fmt::Display for Compact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        write!(
            f,
            "{:04}{:02}{:02}_{:02}{:02}{:02}",
            t.year, t.month, t.day, t.hour, t.minute, t.second
        )
    }
}

// Howard Hinnant's civil_from_days, restricted to days after the Unix epoch.
#[expect(clippy::cast_possible_truncation)]
const fn civil_from_days(days: u64) -> (u64, u8, u8) {
    // Shift the epoch to 0000-03-01 so that leap days end the year.
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;

    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + (month <= 2) as u64;

    (year, month, day)
}

/// [`WallClock`] reading the host system time, shifted by a fixed UTC offset.
#[cfg(any(test, feature = "std"))]
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock {
    utc_offset_secs: i64,
}

#[cfg(any(test, feature = "std"))]
impl SystemClock {
    /// Creates a clock reporting UTC.
    #[must_use]
    pub const fn utc() -> Self {
        Self { utc_offset_secs: 0 }
    }

    /// Creates a clock reporting local time `utc_offset_secs` ahead of UTC.
    #[must_use]
    pub const fn with_offset(utc_offset_secs: i64) -> Self {
        Self { utc_offset_secs }
    }
}

#[cfg(any(test, feature = "std"))]
impl WallClock for SystemClock {
    fn now(&self) -> Option<CalendarTime> {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?;
        let secs = i64::try_from(since_epoch.as_secs())
            .ok()?
            .checked_add(self.utc_offset_secs)?;
        Some(CalendarTime::from_unix_secs(u64::try_from(secs).ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch() {
        let t = CalendarTime::from_unix_secs(0);
        assert_eq!(t.to_string(), "1970-01-01 00:00:00");
        assert_eq!(t.compact().to_string(), "19700101_000000");
    }

    #[test]
    fn century_rules() {
        // 2000-02-29 exists, 2100-02-29 does not.
        assert_eq!(
            CalendarTime::from_unix_secs(951_782_400).to_string(),
            "2000-02-29 00:00:00"
        );
        assert_eq!(
            CalendarTime::from_unix_secs(4_107_542_400).to_string(),
            "2100-03-01 00:00:00"
        );
        assert_eq!(
            CalendarTime::from_unix_secs(1_735_689_599).to_string(),
            "2024-12-31 23:59:59"
        );
    }

    #[test]
    fn system_clock_applies_offset() {
        let utc = SystemClock::utc().now().unwrap();
        let local = SystemClock::with_offset(8 * 3600).now().unwrap();
        assert!(utc.year >= 2024);
        assert!(local > utc);
        assert!(SystemClock::with_offset(i64::MIN).now().is_none());
    }
}
