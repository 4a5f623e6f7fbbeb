//! Recurrence expansion and per-day occupancy resolution.
//!
//! `expand` turns a validated [`Event`] into the ordered set of dates
//! it occupies inside a finite window. `resolve_day` picks the single
//! event a calendar cell should display when several occupy the same
//! date. Both are pure functions: no state, no I/O, safe to call from
//! anywhere.

use chrono::{Datelike, Duration, NaiveDate};

use crate::date_range::{last_day_of_month, DateRange};
use crate::event::{Event, Recurrence};

/// Weekday index with 0=Sunday..6=Saturday, matching
/// `Event::recurrence_days`.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Expand an event into every date it occupies within `window`.
///
/// The result is sorted and deduplicated. Candidate occurrence starts
/// are generated from `start_date` regardless of where the window
/// begins, so a recurrence created years ago still lands on the right
/// weekdays in a window queried today. Each occurrence reproduces the
/// full `start_date..=end_date` span of the base event, anchored at
/// the candidate date; `recurrence_end` bounds the candidate starts,
/// not the trailing days of the final span.
///
/// Assumes a validated event (see `EventDraft::validated`); malformed
/// recurrence fields are rejected there, never here.
pub fn expand(event: &Event, window: &DateRange) -> Vec<NaiveDate> {
    let span = event.span_days();
    let mut dates = Vec::new();

    let mut push_occurrence = |anchor: NaiveDate| {
        for offset in 0..=span {
            let day = anchor + Duration::days(offset);
            if window.contains(day) {
                dates.push(day);
            }
        }
    };

    // Candidate starts stop at the recurrence end or the window end,
    // whichever comes first. This is the bound that keeps expansion
    // finite.
    let last_anchor = match event.recurrence_end {
        Some(end) => end.min(window.to),
        None => window.to,
    };

    // Validation folds biweekly/custom into weekly, but a hand-built
    // Event may still carry them; give them their documented meaning.
    let (frequency, interval) = match event.recurrence {
        Recurrence::Biweekly => (Recurrence::Weekly, 2),
        Recurrence::Custom => (Recurrence::Weekly, i64::from(event.recurrence_interval.max(1))),
        other => (other, i64::from(event.recurrence_interval.max(1))),
    };

    match frequency {
        Recurrence::None => {
            push_occurrence(event.start_date);
        }
        Recurrence::Daily => {
            let mut anchor = event.start_date;
            while anchor <= last_anchor {
                push_occurrence(anchor);
                anchor += Duration::days(interval);
            }
        }
        Recurrence::Weekly if !event.recurrence_days.is_empty() => {
            // Walk interval-week blocks anchored on the Sunday of the
            // start date's week; each block contributes its matching
            // weekdays.
            let mut week = event.start_date
                - Duration::days(i64::from(weekday_index(event.start_date)));
            while week <= last_anchor {
                for &day in &event.recurrence_days {
                    let anchor = week + Duration::days(i64::from(day));
                    if anchor >= event.start_date && anchor <= last_anchor {
                        push_occurrence(anchor);
                    }
                }
                week += Duration::days(7 * interval);
            }
        }
        Recurrence::Weekly => {
            let mut anchor = event.start_date;
            while anchor <= last_anchor {
                push_occurrence(anchor);
                anchor += Duration::days(7 * interval);
            }
        }
        Recurrence::Monthly => {
            for step in 0.. {
                let anchor = add_months_clamped(event.start_date, step * interval);
                if anchor > last_anchor {
                    break;
                }
                push_occurrence(anchor);
            }
        }
        Recurrence::Yearly => {
            for step in 0.. {
                let anchor = add_months_clamped(event.start_date, step * interval * 12);
                if anchor > last_anchor {
                    break;
                }
                push_occurrence(anchor);
            }
        }
        // Handled by the (frequency, interval) normalization above.
        Recurrence::Biweekly | Recurrence::Custom => unreachable!(),
    }

    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Does the event occupy this single date?
pub fn occupies(event: &Event, date: NaiveDate) -> bool {
    !expand(event, &DateRange::single(date)).is_empty()
}

/// Resolve which event a single calendar cell displays.
///
/// Tie-break, in order: non-custody kinds (holiday, travel, activity)
/// beat custody, then the highest id wins, then the latest
/// `created_at`. This is purely a display choice; every matching event
/// stays queryable through [`expand`].
pub fn resolve_day<'a>(date: NaiveDate, events: &'a [Event]) -> Option<&'a Event> {
    events
        .iter()
        .filter(|e| occupies(e, date))
        .max_by_key(|e| (e.kind.is_exceptional(), e.id, e.created_at))
}

/// All events occupying a date, for detail views that must not lose
/// anything to the display tie-break.
pub fn events_on_day<'a>(date: NaiveDate, events: &'a [Event]) -> Vec<&'a Event> {
    events.iter().filter(|e| occupies(e, date)).collect()
}

/// Step forward by whole months, keeping the day-of-month and clamping
/// to the last valid day of short months (Jan 31 + 1 month = Feb 28/29).
fn add_months_clamped(date: NaiveDate, months: i64) -> NaiveDate {
    let total = i64::from(date.month0()) + months;
    let year = date.year() + (total.div_euclid(12)) as i32;
    let month = (total.rem_euclid(12) + 1) as u32;
    NaiveDate::from_ymd_opt(year, month, date.day())
        .unwrap_or_else(|| last_day_of_month(year, month))
}
