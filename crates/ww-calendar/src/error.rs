// error.rs — Error types for ISO week parsing.

use thiserror::Error;

/// Errors that can occur while parsing or constructing calendar ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// The text is not of the form `YYYY-Www`.
    #[error("invalid week id: {0:?} (expected YYYY-Www)")]
    InvalidWeekId(String),

    /// The week number does not exist in that ISO year.
    #[error("week {week} is out of range for ISO year {year} (1..={max})")]
    WeekOutOfRange { year: i32, week: u32, max: u32 },

    /// The text is not of the form `YYYY-MM`.
    #[error("invalid month id: {0:?} (expected YYYY-MM)")]
    InvalidMonthId(String),
}
