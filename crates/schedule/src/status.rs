use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Oncoming,
    Done,
    Canceled,
    // Older records carry the misspelled form.
    #[serde(alias = "reschedueld")]
    Rescheduled,
    Late,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oncoming => "oncoming",
            Self::Done => "done",
            Self::Canceled => "canceled",
            Self::Rescheduled => "rescheduled",
            Self::Late => "late",
        }
    }

    /// Whether the appointment can still take place.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Oncoming | Self::Rescheduled | Self::Late)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
