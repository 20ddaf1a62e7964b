//! Wall clock access and access-log timestamp formatting.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::constants::{MIN_SYNCHRONIZED_YEAR, TIMESTAMP_FORMAT};
use crate::timezone::PosixTz;

/// Source of the current wall-clock time.
pub trait WallClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl WallClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: WallClock + ?Sized> WallClock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Returns `true` once the clock reads a plausible date.
///
/// An unsynchronized device boots at the epoch; any year before
/// `MIN_SYNCHRONIZED_YEAR` means network time has not arrived yet.
#[must_use]
pub fn is_synchronized(instant: &DateTime<Utc>) -> bool {
    instant.year() >= MIN_SYNCHRONIZED_YEAR
}

/// Renders the current instant as local time in a configured zone.
///
/// Output is `YYYY-MM-DDTHH:MM:SSZ`. The `Z` is a literal suffix kept for
/// compatibility with existing log consumers; the digits are local time.
///
/// Formatting never fails. An unsynchronized clock yields a date near 1970,
/// which is reported as is.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tagwatch_core::{FixedClock, PosixTz, TimestampFormatter};
///
/// let zone = PosixTz::parse("IST-2IDT,M3.4.4/26,M10.5.0").unwrap();
/// let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
/// let formatter = TimestampFormatter::with_clock(clock, zone);
///
/// assert_eq!(formatter.now_formatted(), "2024-03-01T14:00:00Z");
/// ```
#[derive(Debug, Clone)]
pub struct TimestampFormatter<C = SystemClock> {
    clock: C,
    zone: PosixTz,
}

impl TimestampFormatter<SystemClock> {
    /// Formatter reading the system clock.
    #[must_use]
    pub fn new(zone: PosixTz) -> Self {
        Self::with_clock(SystemClock, zone)
    }
}

impl<C: WallClock> TimestampFormatter<C> {
    /// Formatter reading an explicit clock.
    #[must_use]
    pub fn with_clock(clock: C, zone: PosixTz) -> Self {
        Self { clock, zone }
    }

    /// Configured zone.
    #[must_use]
    pub fn zone(&self) -> &PosixTz {
        &self.zone
    }

    /// Current instant as read from the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Format the current instant.
    #[must_use]
    pub fn now_formatted(&self) -> String {
        self.format(&self.clock.now())
    }

    /// Format an explicit instant.
    #[must_use]
    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        self.zone
            .to_local(instant)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}
