//! ICS export.
//!
//! Date-times are emitted as floating local values (no `Z`, no
//! `TZID`), matching the floating-time model of the event store. The
//! stored `time_zone` is deliberately not applied; see the module
//! notes on `event`.

use chrono::NaiveDate;
use icalendar::{Calendar, Component, EventLike};

use crate::error::CoParentResult;
use crate::event::{Event, Recurrence};

/// Fixed product identifier stamped on every exported calendar.
pub const PRODID: &str = "-//coparent//custody calendar//EN";

const BYDAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Serialize events into a single VCALENDAR text blob (CRLF lines),
/// ready for download. The caller filters the collection; nothing is
/// expanded here — recurring events are emitted as their base span
/// plus a derived RRULE.
pub fn export_ics(events: &[Event]) -> CoParentResult<String> {
    let mut cal = Calendar::new();

    for event in events {
        cal.push(vevent(event));
    }

    let cal = cal.done();
    Ok(finalize(&cal.to_string()))
}

/// Default download filename for an export performed on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("coparent-calendar-{}.ics", date.format("%Y-%m-%d"))
}

fn vevent(event: &Event) -> icalendar::Event {
    let mut ics = icalendar::Event::new();

    ics.uid(&format!("coparent-{}@coparent", event.id));
    ics.summary(&event.title);

    // DTSTAMP is required by RFC 5545; created_at keeps it deterministic.
    let dtstamp = event.created_at.format("%Y%m%dT%H%M%SZ").to_string();
    ics.add_property("DTSTAMP", &dtstamp);

    // Floating local date-times: dashes stripped from the date, colons
    // from the time, literal 00 seconds.
    ics.add_property("DTSTART", &floating(event, true));
    ics.add_property("DTEND", &floating(event, false));

    ics.description(event.description.as_deref().unwrap_or(""));
    if let Some(ref location) = event.location {
        ics.location(location);
    }

    if let Some(rrule) = derive_rrule(event) {
        ics.add_property("RRULE", &rrule);
    }

    ics.done()
}

fn floating(event: &Event, start: bool) -> String {
    let (date, time) = if start {
        (event.start_date, event.start_time)
    } else {
        (event.end_date, event.end_time)
    };
    format!("{}T{}00", date.format("%Y%m%d"), time.format("%H%M"))
}

/// Reconstruct an RRULE from the recurrence descriptor so that
/// export→import round-trips recurring events instead of flattening
/// them to a single span.
fn derive_rrule(event: &Event) -> Option<String> {
    let freq = match event.recurrence {
        Recurrence::None => return None,
        Recurrence::Daily => "DAILY",
        Recurrence::Weekly | Recurrence::Biweekly | Recurrence::Custom => "WEEKLY",
        Recurrence::Monthly => "MONTHLY",
        Recurrence::Yearly => "YEARLY",
    };

    let mut rrule = format!("FREQ={}", freq);

    let interval = if event.recurrence == Recurrence::Biweekly {
        2
    } else {
        event.recurrence_interval
    };
    if interval > 1 {
        rrule.push_str(&format!(";INTERVAL={}", interval));
    }

    if !event.recurrence_days.is_empty() {
        let days: Vec<&str> = event
            .recurrence_days
            .iter()
            .filter_map(|d| BYDAY_CODES.get(*d as usize).copied())
            .collect();
        if !days.is_empty() {
            rrule.push_str(&format!(";BYDAY={}", days.join(",")));
        }
    }

    if let Some(until) = event.recurrence_end {
        rrule.push_str(&format!(";UNTIL={}", until.format("%Y%m%d")));
    }

    Some(rrule)
}

/// Post-process the icalendar crate's output into the published shape:
/// our PRODID and a METHOD:PUBLISH header. CALSCALE:GREGORIAN and
/// VERSION:2.0 come from the crate as-is.
fn finalize(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len() + 32);

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(PRODID);
            out.push_str("\r\n");
            out.push_str("METHOD:PUBLISH\r\n");
            continue;
        }
        out.push_str(line);
        out.push_str("\r\n");
    }

    out
}
