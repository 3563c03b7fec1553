//! The clinic's canonical slot grid

use std::iter::FusedIterator;

use crate::time::{ClockTime, TimeSlot};
use crate::ScheduleError;

/// Fixed sequence of bookable slots between opening and closing time
///
/// The default grid runs from 08:00 to 17:00 in 30-minute steps. Every slot
/// starts where the previous one ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    open: ClockTime,
    close: ClockTime,
    step_minutes: u16,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            open: ClockTime::at(8, 0),
            close: ClockTime::at(17, 0),
            step_minutes: 30,
        }
    }
}

impl SlotGrid {
    /// The window `open..close` must be a whole number of steps.
    pub fn new(open: ClockTime, close: ClockTime, step_minutes: u16) -> Result<Self, ScheduleError> {
        if step_minutes == 0 {
            return Err(ScheduleError::InvalidGrid("step must be positive".to_string()));
        }
        if open >= close {
            return Err(ScheduleError::InvalidGrid(format!(
                "opening time {} is not before closing time {}",
                open, close
            )));
        }
        let window = close.minutes_since_midnight() - open.minutes_since_midnight();
        if window % step_minutes != 0 {
            return Err(ScheduleError::InvalidGrid(format!(
                "{}-{} is not a multiple of {} minutes",
                open, close, step_minutes
            )));
        }
        Ok(Self {
            open,
            close,
            step_minutes,
        })
    }

    pub fn open(&self) -> ClockTime {
        self.open
    }

    pub fn close(&self) -> ClockTime {
        self.close
    }

    pub fn step_minutes(&self) -> u16 {
        self.step_minutes
    }

    /// Number of slots in the grid.
    pub fn len(&self) -> usize {
        let window = self.close.minutes_since_midnight() - self.open.minutes_since_midnight();
        usize::from(window / self.step_minutes)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh iterator over the grid, from the first slot of the day.
    pub fn slots(&self) -> Slots {
        Slots {
            next_start: self.open.minutes_since_midnight(),
            end: self.close.minutes_since_midnight(),
            step: self.step_minutes,
        }
    }

    /// Whether `slot` starts and ends on grid boundaries inside opening hours.
    ///
    /// A slot may span several steps, e.g. `09:00-10:00` on the half-hour grid.
    pub fn aligns(&self, slot: &TimeSlot) -> bool {
        let open = self.open.minutes_since_midnight();
        let from = slot.from().minutes_since_midnight();
        let to = slot.to().minutes_since_midnight();
        from >= open
            && to <= self.close.minutes_since_midnight()
            && (from - open) % self.step_minutes == 0
            && (to - open) % self.step_minutes == 0
    }

    /// Whether `slot` is exactly one of the grid's slots.
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.aligns(slot) && slot.duration_minutes() == self.step_minutes
    }

    /// `Ok` if the slot aligns with the grid, `OffGrid` otherwise.
    pub fn check(&self, slot: &TimeSlot) -> Result<(), ScheduleError> {
        if self.aligns(slot) {
            Ok(())
        } else {
            Err(ScheduleError::OffGrid(slot.to_string()))
        }
    }
}

/// Iterator over the slots of a [`SlotGrid`]
#[derive(Debug, Clone)]
pub struct Slots {
    next_start: u16,
    end: u16,
    step: u16,
}

impl Iterator for Slots {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<Self::Item> {
        let stop = self.next_start + self.step;
        if stop > self.end {
            return None;
        }
        let from = ClockTime::from_minutes(self.next_start)?;
        let to = ClockTime::from_minutes(stop)?;
        self.next_start = stop;
        TimeSlot::new(from, to).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.end.saturating_sub(self.next_start) / self.step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Slots {}

impl FusedIterator for Slots {}

/// The clinic's default half-hour grid, 08:00 to 17:00.
pub fn canonical_slots() -> Vec<TimeSlot> {
    SlotGrid::default().slots().collect()
}
