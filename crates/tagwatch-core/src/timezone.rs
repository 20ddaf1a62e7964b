//! POSIX `TZ` rule evaluation.
//!
//! The terminal's local zone is configured as a POSIX rule string, the form an
//! embedded C library accepts in the `TZ` variable:
//!
//! ```text
//! std offset [dst [offset] ,start[/time] ,end[/time]]
//! ```
//!
//! - `std`/`dst` are zone abbreviations of three or more letters, or any
//!   `<...>` quoted text.
//! - `offset` is `[+-]hh[:mm[:ss]]` **west** of UTC (`IST-2` is UTC+2). The
//!   daylight offset defaults to one hour ahead of standard time.
//! - `start`/`end` are `Mm.w.d` dates (month, week 1-5 where 5 is the last,
//!   weekday 0-6 from Sunday). `time` defaults to `02:00:00` and may exceed
//!   24 hours (`/26` is 02:00 on the following day).
//!
//! Only month-week-day transition dates are supported.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use tagwatch_core::PosixTz;
//!
//! let zone = PosixTz::parse("IST-2IDT,M3.4.4/26,M10.5.0").unwrap();
//!
//! let winter = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
//! assert_eq!(zone.offset_at(&winter).local_minus_utc(), 2 * 3600);
//!
//! let summer = Utc.with_ymd_and_hms(2024, 7, 10, 12, 0, 0).unwrap();
//! assert_eq!(zone.offset_at(&summer).local_minus_utc(), 3 * 3600);
//! ```

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Largest UTC offset accepted for either zone component (hours).
const MAX_OFFSET_HOURS: u32 = 24;

/// Largest transition time accepted (hours past local midnight).
const MAX_TRANSITION_HOURS: u32 = 167;

/// Transition time used when a date has no `/time` suffix (02:00:00).
const DEFAULT_TRANSITION_SECS: i32 = 2 * 3600;

/// A parsed POSIX time-zone rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixTz {
    rule: String,
    std_name: String,
    std_offset: FixedOffset,
    daylight: Option<DaylightRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DaylightRule {
    name: String,
    offset: FixedOffset,
    start: Transition,
    end: Transition,
}

/// `Mm.w.d/time` transition date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    month: u32,
    week: u32,
    weekday: u32,
    time_secs: i32,
}

impl PosixTz {
    /// Parse a POSIX rule string.
    ///
    /// # Errors
    /// Returns `Error::InvalidTimeZone` when the rule is malformed, uses an
    /// unsupported transition form, or names a daylight zone without
    /// transition dates.
    pub fn parse(rule: &str) -> Result<Self> {
        let mut cursor = Cursor::new(rule);

        let std_name = cursor.name()?;
        let std_offset = cursor.offset()?;

        let daylight = if cursor.is_done() {
            None
        } else {
            let name = cursor.name()?;
            let offset = if cursor.starts_offset() {
                cursor.offset()?
            } else {
                fixed_offset(rule, std_offset.local_minus_utc() + 3600)?
            };

            if !cursor.eat(b',') {
                return Err(Error::time_zone(
                    rule,
                    "daylight zone requires start and end dates",
                ));
            }
            let start = cursor.transition()?;
            cursor.expect(b',')?;
            let end = cursor.transition()?;

            Some(DaylightRule {
                name,
                offset,
                start,
                end,
            })
        };

        if !cursor.is_done() {
            return Err(Error::time_zone(rule, "unexpected trailing characters"));
        }

        Ok(Self {
            rule: rule.to_string(),
            std_name,
            std_offset,
            daylight,
        })
    }

    /// The rule string this zone was parsed from.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Abbreviation of standard time.
    #[must_use]
    pub fn std_name(&self) -> &str {
        &self.std_name
    }

    /// Abbreviation of daylight time, if the zone observes it.
    #[must_use]
    pub fn dst_name(&self) -> Option<&str> {
        self.daylight.as_ref().map(|d| d.name.as_str())
    }

    /// Returns `true` if daylight time is in effect at `instant`.
    #[must_use]
    pub fn is_dst(&self, instant: &DateTime<Utc>) -> bool {
        self.daylight
            .as_ref()
            .is_some_and(|d| d.is_active(instant, self.std_offset))
    }

    /// UTC offset in effect at `instant`.
    #[must_use]
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match &self.daylight {
            Some(daylight) if daylight.is_active(instant, self.std_offset) => daylight.offset,
            _ => self.std_offset,
        }
    }

    /// Convert `instant` to local time in this zone.
    #[must_use]
    pub fn to_local(&self, instant: &DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(instant))
    }
}

impl fmt::Display for PosixTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule)
    }
}

impl std::str::FromStr for PosixTz {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PosixTz::parse(s)
    }
}

impl DaylightRule {
    fn is_active(&self, instant: &DateTime<Utc>, std_offset: FixedOffset) -> bool {
        let year = instant.with_timezone(&std_offset).year();
        let (Some(start), Some(end)) = (
            self.start.local_datetime(year),
            self.end.local_datetime(year),
        ) else {
            return false;
        };

        // Start is given in standard time, end in daylight time.
        let start_utc = start - Duration::seconds(i64::from(std_offset.local_minus_utc()));
        let end_utc = end - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let now = instant.naive_utc();

        if start_utc < end_utc {
            now >= start_utc && now < end_utc
        } else {
            // Southern hemisphere: daylight time spans the new year.
            !(now >= end_utc && now < start_utc)
        }
    }
}

impl Transition {
    /// Calendar date of this transition in `year`.
    fn date(&self, year: i32) -> Option<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(year, self.month, 1)?;
        let first_weekday = first.weekday().num_days_from_sunday();
        let last_day = days_in_month(year, self.month)?;

        let mut day = 1 + (self.weekday + 7 - first_weekday) % 7 + (self.week - 1) * 7;
        while day > last_day {
            day -= 7;
        }
        NaiveDate::from_ymd_opt(year, self.month, day)
    }

    fn local_datetime(&self, year: i32) -> Option<NaiveDateTime> {
        let midnight = self.date(year)?.and_hms_opt(0, 0, 0)?;
        Some(midnight + Duration::seconds(i64::from(self.time_secs)))
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.pred_opt()?.day())
}

fn fixed_offset(rule: &str, east_secs: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(east_secs)
        .ok_or_else(|| Error::time_zone(rule, format!("offset {east_secs}s out of range")))
}

/// Byte cursor over a rule string.
struct Cursor<'a> {
    rule: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(rule: &'a str) -> Self {
        Self {
            rule,
            bytes: rule.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn is_done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected as char)))
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::time_zone(
            self.rule,
            format!("{} at position {}", reason.into(), self.pos),
        )
    }

    fn starts_offset(&self) -> bool {
        matches!(self.peek(), Some(b'+' | b'-' | b'0'..=b'9'))
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        let name = if self.eat(b'<') {
            while let Some(b) = self.peek() {
                if b == b'>' {
                    break;
                }
                if !(b.is_ascii_alphanumeric() || b == b'+' || b == b'-') {
                    return Err(self.error("invalid character in quoted zone name"));
                }
                self.pos += 1;
            }
            let name = &self.rule[start + 1..self.pos];
            self.expect(b'>')?;
            name
        } else {
            while self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
                self.pos += 1;
            }
            &self.rule[start..self.pos]
        };

        if name.len() < 3 {
            return Err(self.error("zone name must have at least 3 characters"));
        }
        Ok(name.to_string())
    }

    fn number(&mut self, max: u32) -> Result<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(b) = self.peek().filter(u8::is_ascii_digit) {
            value = value.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a number"));
        }
        if value > max {
            return Err(self.error(format!("{value} exceeds {max}")));
        }
        Ok(value)
    }

    /// `[+-]hh[:mm[:ss]]` as signed seconds.
    fn duration(&mut self, max_hours: u32) -> Result<i32> {
        let negative = if self.eat(b'-') {
            true
        } else {
            self.eat(b'+');
            false
        };

        let hours = self.number(max_hours)?;
        let minutes = if self.eat(b':') { self.number(59)? } else { 0 };
        let seconds = if self.eat(b':') { self.number(59)? } else { 0 };

        // Bounded by max_hours <= 167, so this fits in i32.
        let total = (hours * 3600 + minutes * 60 + seconds) as i32;
        Ok(if negative { -total } else { total })
    }

    /// A zone offset, converted from POSIX "west of UTC" to east seconds.
    fn offset(&mut self) -> Result<FixedOffset> {
        let west = self.duration(MAX_OFFSET_HOURS)?;
        fixed_offset(self.rule, -west)
    }

    fn transition(&mut self) -> Result<Transition> {
        if !self.eat(b'M') {
            return Err(self.error("only Mm.w.d transition dates are supported"));
        }
        let month = self.number(12)?;
        self.expect(b'.')?;
        let week = self.number(5)?;
        self.expect(b'.')?;
        let weekday = self.number(6)?;

        if month == 0 || week == 0 {
            return Err(self.error("month and week start at 1"));
        }

        let time_secs = if self.eat(b'/') {
            self.duration(MAX_TRANSITION_HOURS)?
        } else {
            DEFAULT_TRANSITION_SECS
        };

        Ok(Transition {
            month,
            week,
            weekday,
            time_secs,
        })
    }
}
