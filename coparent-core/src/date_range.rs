//! Finite date window for expansion and event queries.

use chrono::{Duration, NaiveDate, Utc};

use crate::error::{CoParentError, CoParentResult};

/// Default window: ±DEFAULT_WINDOW_DAYS around today when the caller
/// gives no bounds.
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

/// An inclusive, always-finite calendar-date window.
///
/// Expansion is only defined over a bounded window; making both bounds
/// mandatory here is what turns the "unbounded expansion" failure mode
/// into a compile-time impossibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        DateRange {
            from: today - Duration::days(DEFAULT_WINDOW_DAYS),
            to: today + Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> CoParentResult<Self> {
        if to < from {
            return Err(CoParentError::Validation(format!(
                "Window end {} is before window start {}",
                to, from
            )));
        }
        Ok(DateRange { from, to })
    }

    /// The one-day window covering `date`.
    pub fn single(date: NaiveDate) -> Self {
        DateRange {
            from: date,
            to: date,
        }
    }

    /// The full calendar month containing the first of `year`-`month`.
    pub fn month(year: i32, month: u32) -> CoParentResult<Self> {
        let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            CoParentError::Validation(format!("Invalid month {}-{:02}", year, month))
        })?;
        let to = last_day_of_month(year, month);
        Ok(DateRange { from, to })
    }

    /// Parse optional YYYY-MM-DD bounds, defaulting each missing side
    /// to ±DEFAULT_WINDOW_DAYS from today.
    pub fn from_args(from: Option<&str>, to: Option<&str>) -> CoParentResult<Self> {
        let default = DateRange::default();
        let from = match from {
            Some(s) => parse_date(s)?,
            None => default.from,
        };
        let to = match to {
            Some(s) => parse_date(s)?,
            None => default.to,
        };
        DateRange::new(from, to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// All dates in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |d| *d <= self.to)
    }
}

/// Last calendar day of a month. `month` must be 1..=12.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // Safe for any valid month: the first of the next month always exists.
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|d| d - Duration::days(1))
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap_or_default())
}

fn parse_date(s: &str) -> CoParentResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        CoParentError::Validation(format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_window_is_rejected() {
        let from = "2025-02-01".parse().unwrap();
        let to = "2025-01-01".parse().unwrap();
        assert!(DateRange::new(from, to).is_err());
    }

    #[test]
    fn month_window_covers_whole_month() {
        let feb = DateRange::month(2025, 2).unwrap();
        assert_eq!(feb.from, "2025-02-01".parse::<NaiveDate>().unwrap());
        assert_eq!(feb.to, "2025-02-28".parse::<NaiveDate>().unwrap());
        assert_eq!(feb.days().count(), 28);
    }

    #[test]
    fn leap_february_has_29_days() {
        assert_eq!(
            last_day_of_month(2024, 2),
            "2024-02-29".parse::<NaiveDate>().unwrap()
        );
    }

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(
            last_day_of_month(2025, 12),
            "2025-12-31".parse::<NaiveDate>().unwrap()
        );
    }

    #[test]
    fn from_args_parses_explicit_bounds() {
        let range = DateRange::from_args(Some("2025-01-01"), Some("2025-01-14")).unwrap();
        assert_eq!(range.days().count(), 14);
    }

    #[test]
    fn from_args_rejects_garbage() {
        assert!(DateRange::from_args(Some("01/01/2025"), None).is_err());
    }
}
