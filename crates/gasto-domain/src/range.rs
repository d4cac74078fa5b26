//! Inclusive calendar date ranges used to bound every dashboard aggregate.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Inclusive `[from, to]` range of calendar dates. Always satisfies `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Builds a range anchored on `from`; a `to` earlier than `from` is moved up to `from`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to: to.max(from),
        }
    }

    /// First through last day of the month containing `today`.
    pub fn current_month(today: NaiveDate) -> Self {
        let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
        let length = i64::from(days_in_month(first.year(), first.month()));
        let last = first + Duration::days(length - 1);
        Self::new(first, last)
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Moves the start bound. When it passes the end, the end follows it.
    pub fn with_from(self, from: NaiveDate) -> Self {
        Self {
            from,
            to: self.to.max(from),
        }
    }

    /// Moves the end bound. When it precedes the start, the start follows it.
    pub fn with_to(self, to: NaiveDate) -> Self {
        Self {
            from: self.from.min(to),
            to,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of calendar days covered, counting both bounds.
    pub fn day_count(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.from, self.to)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
