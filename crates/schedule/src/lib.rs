//! VetDesk schedule domain
//!
//! Pure value types for booking: calendar-checked reservation dates, `HH:MM`
//! clock times, time slots and the clinic's half-hour slot grid. Nothing in
//! this crate performs I/O.

mod date;
mod grid;
mod status;
mod time;

use thiserror::Error;

pub use date::{from_instant, normalize, same_day, to_instant, validate_date, ReservationDate};
pub use grid::{canonical_slots, SlotGrid, Slots};
pub use status::ReservationStatus;
pub use time::{parse_time_slot, ClockTime, TimeSlot};

/// Errors raised while validating schedule values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The triple does not name a day on the calendar
    #[error("Invalid date: {day}/{month}/{year} does not exist")]
    InvalidDate { day: u32, month: u32, year: i32 },

    /// Not a zero-padded 24-hour `HH:MM` value
    #[error("Invalid time format (HH:MM): {0}")]
    InvalidTimeFormat(String),

    #[error("Invalid time slot: {0}")]
    InvalidSlot(String),

    /// Well-formed slot that does not sit on the clinic grid
    #[error("Slot {0} is not on the clinic grid")]
    OffGrid(String),

    #[error("Invalid slot grid: {0}")]
    InvalidGrid(String),
}
