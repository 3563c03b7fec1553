//! `HH:MM` clock times and the time slots built from them

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ScheduleError;

const CLOCK_TIME_PATTERN: &str = r"^([01]\d|2[0-3]):([0-5]\d)$";

static CLOCK_TIME: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn clock_time_regex() -> Result<&'static Regex, ScheduleError> {
    CLOCK_TIME
        .get_or_init(|| Regex::new(CLOCK_TIME_PATTERN))
        .as_ref()
        .map_err(|e| ScheduleError::InvalidTimeFormat(e.to_string()))
}

/// Time of day with minute precision, written `HH:MM` (24-hour, zero-padded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTimeFormat(format!(
                "{}:{}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Callers guarantee `hour <= 23` and `minute <= 59`.
    pub(crate) const fn at(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// `None` past 23:59.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes >= 24 * 60 {
            return None;
        }
        Some(Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = clock_time_regex()?
            .captures(s)
            .ok_or_else(|| ScheduleError::InvalidTimeFormat(s.to_string()))?;
        let hour = captures[1]
            .parse()
            .map_err(|_| ScheduleError::InvalidTimeFormat(s.to_string()))?;
        let minute = captures[2]
            .parse()
            .map_err(|_| ScheduleError::InvalidTimeFormat(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A bookable interval `{ from, to }` with `from` strictly before `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SlotBounds")]
pub struct TimeSlot {
    from: ClockTime,
    to: ClockTime,
}

#[derive(Deserialize)]
struct SlotBounds {
    from: ClockTime,
    to: ClockTime,
}

impl TryFrom<SlotBounds> for TimeSlot {
    type Error = ScheduleError;

    fn try_from(bounds: SlotBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.from, bounds.to)
    }
}

impl TimeSlot {
    pub fn new(from: ClockTime, to: ClockTime) -> Result<Self, ScheduleError> {
        if from >= to {
            return Err(ScheduleError::InvalidSlot(format!(
                "{} does not start before {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Build a slot from its two `HH:MM` bounds.
    pub fn parse(from: &str, to: &str) -> Result<Self, ScheduleError> {
        Self::new(from.parse()?, to.parse()?)
    }

    pub fn from(&self) -> ClockTime {
        self.from
    }

    pub fn to(&self) -> ClockTime {
        self.to
    }

    pub fn duration_minutes(&self) -> u16 {
        self.to.minutes_since_midnight() - self.from.minutes_since_midnight()
    }

    /// Touching slots (one ends where the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.from < other.to && other.from < self.to
    }
}

impl FromStr for TimeSlot {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_slot(s)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Parse a slot written `HH:MM-HH:MM`.
pub fn parse_time_slot(s: &str) -> Result<TimeSlot, ScheduleError> {
    let (from, to) = s
        .split_once('-')
        .ok_or_else(|| ScheduleError::InvalidTimeFormat(s.to_string()))?;
    TimeSlot::parse(from.trim(), to.trim())
}
