// week.rs — WeekId: an ISO-8601 week, the unit every goal is scoped to.
//
// ISO weeks start on Monday; week 1 of a year is the week containing that
// year's first Thursday. The ISO year of a week can differ from the calendar
// year of some of its days (2025-W01 starts on Monday 2024-12-30).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;
use crate::month::MonthId;

/// An ISO week id, displayed as `YYYY-Www`.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId {
    year: i32,
    week: u32,
}

/// Monday and Sunday (inclusive) of one ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl WeekId {
    /// Build a week id, rejecting week numbers the ISO year does not have.
    pub fn new(year: i32, week: u32) -> Result<Self, CalendarError> {
        let max = weeks_in_year(year);
        if week == 0 || week > max {
            return Err(CalendarError::WeekOutOfRange { year, week, max });
        }
        Ok(Self { year, week })
    }

    /// The ISO week containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// ISO week-numbering year. Week documents are keyed by this year.
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn monday(&self) -> NaiveDate {
        // Constructors only admit weeks that exist, so the lookup cannot miss.
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn range(&self) -> WeekRange {
        let start = self.monday();
        WeekRange {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn month_id(&self) -> MonthId {
        MonthId::from_date(self.monday())
    }

    /// The week `n` weeks after this one (before it when `n` is negative).
    pub fn offset(&self, n: i64) -> Self {
        Self::from_date(self.monday() + Duration::days(7 * n))
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// Exact number of weeks from `self` to `other`, crossing 53-week years correctly.
    pub fn weeks_until(&self, other: WeekId) -> i64 {
        (other.monday() - self.monday()).num_days() / 7
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekId {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidWeekId(s.to_string());
        let (year, week) = s.trim().split_once("-W").ok_or_else(invalid)?;
        if year.len() != 4 || week.len() != 2 || !is_digits(year) || !is_digits(week) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        Self::new(year, week)
    }
}

/// ASCII digits only; `str::parse` would also take a sign.
pub(crate) fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl TryFrom<String> for WeekId {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekId> for String {
    fn from(week: WeekId) -> Self {
        week.to_string()
    }
}

/// Number of ISO weeks in `year` (52 or 53).
///
/// December 28th always falls in the last ISO week of its year.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

/// Every week of an ISO year, in order.
pub fn weeks_of_year(year: i32) -> impl Iterator<Item = WeekId> {
    (1..=weeks_in_year(year)).map(move |week| WeekId { year, week })
}

/// The week containing today's local date.
pub fn current_week() -> WeekId {
    WeekId::from_date(Local::now().date_naive())
}
