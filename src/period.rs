//! Calendar period arithmetic — day/week/trailing windows and the
//! date/time parsing shared by every query module.
//!
//! The week used by the agenda is the clinic's working week: Monday
//! through Saturday, six calendar days. A Sunday reference belongs to
//! the upcoming week, so `week_window(sunday).start` is the Monday
//! immediately after the reference. The same rule feeds the calendar
//! grid, which keeps server summaries and rendered day columns on the
//! same boundaries.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use crate::db::StoreError;

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Single-day window: start == end == reference.
pub fn day_window(reference: NaiveDate) -> DateWindow {
    DateWindow {
        start: reference,
        end: reference,
    }
}

/// Working week containing `reference`: Monday..Saturday, 6 days.
///
/// Weekday numbering is 0=Sunday..6=Saturday; start = reference
/// shifted by `1 - weekday` days, which lands Sunday references on the
/// *next* Monday.
pub fn week_window(reference: NaiveDate) -> DateWindow {
    let weekday = i64::from(reference.weekday().num_days_from_sunday());
    let start = reference + Duration::days(1 - weekday);
    DateWindow {
        start,
        end: start + Duration::days(5),
    }
}

/// Trailing window ending at `reference`, starting `months_back` months
/// earlier. The month shift clamps to the last valid day of the target
/// month (Mar 31 − 1 month → Feb 28/29).
pub fn trailing_months(reference: NaiveDate, months_back: u32) -> DateWindow {
    let start = reference
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDate::MIN);
    DateWindow {
        start,
        end: reference,
    }
}

/// Trailing window ending at `reference`, starting `days_back` days earlier.
pub fn trailing_days(reference: NaiveDate, days_back: u32) -> DateWindow {
    DateWindow {
        start: reference - Duration::days(i64::from(days_back)),
        end: reference,
    }
}

/// Parse a calendar date in ISO (`2024-03-06`) or the source system's
/// locale format (`06/03/2024`).
pub fn parse_date(raw: &str) -> Result<NaiveDate, StoreError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| StoreError::InvalidDate(raw.to_string()))
}

/// Normalize a clock time (`HH:MM` or `HH:MM:SS`) to minutes since
/// midnight. Seconds are ignored; anything unparseable yields `None`.
pub fn parse_clock(raw: &str) -> Option<u32> {
    let mut parts = raw.trim().splitn(3, ':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}
