//! Calendar dates of reservations and their UTC instants

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ScheduleError;

/// A day on the calendar, `{ day, month, year }` on the wire
///
/// Only real dates can be constructed: `31/4` or `29/2` of a common year are
/// rejected by [`ReservationDate::new`] and when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "DateParts", into = "DateParts")]
pub struct ReservationDate(NaiveDate);

#[derive(Serialize, Deserialize)]
struct DateParts {
    day: u32,
    month: u32,
    year: i32,
}

impl ReservationDate {
    pub fn new(day: u32, month: u32, year: i32) -> Result<Self, ScheduleError> {
        if year < 1 {
            return Err(ScheduleError::InvalidDate { day, month, year });
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .filter(|date| date.day() == day && date.month() == month && date.year() == year)
            .map(Self)
            .ok_or(ScheduleError::InvalidDate { day, month, year })
    }

    /// The UTC calendar day `now` falls on.
    pub fn today(now: DateTime<Utc>) -> Self {
        from_instant(now)
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Midnight UTC of this date.
    pub fn to_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0.and_time(NaiveTime::MIN))
    }
}

impl TryFrom<DateParts> for ReservationDate {
    type Error = ScheduleError;

    fn try_from(parts: DateParts) -> Result<Self, Self::Error> {
        Self::new(parts.day, parts.month, parts.year)
    }
}

impl From<ReservationDate> for DateParts {
    fn from(date: ReservationDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }
}

impl From<ReservationDate> for NaiveDate {
    fn from(date: ReservationDate) -> Self {
        date.0
    }
}

impl fmt::Display for ReservationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.day(), self.month(), self.year())
    }
}

/// True iff `(day, month, year)` names a real calendar date with `year >= 1`.
pub fn validate_date(day: u32, month: u32, year: i32) -> bool {
    ReservationDate::new(day, month, year).is_ok()
}

/// Midnight UTC of `date`.
pub fn to_instant(date: &ReservationDate) -> DateTime<Utc> {
    date.to_instant()
}

/// The UTC calendar day of `instant`; the inverse of [`to_instant`].
pub fn from_instant(instant: DateTime<Utc>) -> ReservationDate {
    ReservationDate(instant.date_naive())
}

/// Truncate `instant` to midnight UTC of its day.
pub fn normalize(instant: DateTime<Utc>) -> DateTime<Utc> {
    from_instant(instant).to_instant()
}

/// Whether both instants fall on the same UTC calendar day.
pub fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}
