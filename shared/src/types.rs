//! Common types used across the platform

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date-time layouts accepted for purchase dates, tried in order
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A purchase date as typed by staff: either a bare calendar date or a full
/// date-time. Stored purchases always carry a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseDate {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised purchase date: {0}")]
pub struct PurchaseDateError(pub String);

impl PurchaseDate {
    /// Attach `time_of_day` to a bare date; date-times pass through untouched.
    pub fn normalize(self, time_of_day: NaiveTime) -> NaiveDateTime {
        match self {
            PurchaseDate::Date(date) => date.and_time(time_of_day),
            PurchaseDate::DateTime(date_time) => date_time,
        }
    }

    /// Whether a stored (normalized) purchase date refers to the same moment.
    ///
    /// A bare date matches any stored time on that day, since the stored time
    /// was filled in at save time and the caller never saw it.
    pub fn matches(&self, stored: &NaiveDateTime) -> bool {
        match self {
            PurchaseDate::Date(date) => stored.date() == *date,
            PurchaseDate::DateTime(date_time) => stored == date_time,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            PurchaseDate::Date(date) => *date,
            PurchaseDate::DateTime(date_time) => date_time.date(),
        }
    }
}

impl FromStr for PurchaseDate {
    type Err = PurchaseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // Offsets are dropped; purchase dates are clinic-local wall time
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(PurchaseDate::DateTime(with_offset.naive_local()));
        }

        for format in DATE_TIME_FORMATS {
            if let Ok(date_time) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(PurchaseDate::DateTime(date_time));
            }
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(PurchaseDate::Date)
            .map_err(|_| PurchaseDateError(s.to_string()))
    }
}

impl fmt::Display for PurchaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseDate::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            PurchaseDate::DateTime(date_time) => {
                write!(f, "{}", date_time.format("%Y-%m-%dT%H:%M:%S"))
            }
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

impl Pagination {
    /// SQL `LIMIT`/`OFFSET` pair, clamping out-of-range input
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, 200) as i64;
        let page = self.page.max(1) as i64;
        (per_page, (page - 1) * per_page)
    }
}
