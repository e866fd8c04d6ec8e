//! # ww-calendar
//!
//! ISO-8601 week arithmetic for Weekwise.
//!
//! Every other Weekwise crate goes through this one for time semantics:
//! goals are scoped to ISO weeks (`2025-W44`), monthly goals are grouped by
//! the calendar month of a week's Monday (`2025-10`), and durations are
//! counted in whole weeks.
//!
//! ## Key components
//!
//! - [`WeekId`] — an ISO week (`YYYY-Www`), ordered chronologically
//! - [`MonthId`] — a calendar month (`YYYY-MM`)
//! - [`WeekRange`] — the Monday..=Sunday span of a week
//! - free functions [`iso_week`], [`parse_week_id`], [`week_range`],
//!   [`month_id_from_week`], [`weeks_between`]

pub mod error;
pub mod month;
pub mod week;

use chrono::NaiveDate;

pub use error::CalendarError;
pub use month::MonthId;
pub use week::{current_week, weeks_in_year, weeks_of_year, WeekId, WeekRange};

/// The ISO week containing `date`.
pub fn iso_week(date: NaiveDate) -> WeekId {
    WeekId::from_date(date)
}

/// Parse a `YYYY-Www` week id.
pub fn parse_week_id(s: &str) -> Result<WeekId, CalendarError> {
    s.parse()
}

/// Monday and Sunday of `week`.
pub fn week_range(week: WeekId) -> WeekRange {
    week.range()
}

/// Calendar month of the Monday of `week`.
pub fn month_id_from_week(week: WeekId) -> MonthId {
    week.month_id()
}

/// Whole weeks from `from` to `to`; negative when `to` precedes `from`.
pub fn weeks_between(from: WeekId, to: WeekId) -> i64 {
    from.weeks_until(to)
}
