//! ICS import: a tolerant, line-oriented VEVENT scan.
//!
//! Import is deliberately lossy: of an `RRULE` only the `FREQ` token
//! survives (interval, by-day and until clauses are dropped), `TZID`
//! parameters are ignored beyond locating the value, and a trailing
//! `Z` UTC marker is stripped rather than converted. Blocks without a
//! title and start date are skipped silently; a bad block never fails
//! the file.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use icalendar::parser::unfold;
use log::debug;

use crate::error::{CoParentError, CoParentResult};
use crate::event::{
    EventDraft, EventKind, Parent, Recurrence, DEFAULT_END_TIME, DEFAULT_START_TIME,
    DEFAULT_TIME_ZONE,
};

/// Upload gate: anything larger than this is rejected before parsing.
pub const MAX_ICS_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// A transient event record at the import boundary. Never persisted
/// directly; always lifted into an [`EventDraft`] first.
#[derive(Debug, Clone, PartialEq)]
pub struct IcalEvent {
    pub title: String,
    pub start: IcsTime,
    pub end: Option<IcsTime>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// The raw RRULE value, kept for diagnostics.
    pub rrule: Option<String>,
    /// FREQ-only normalization of `rrule`.
    pub recurrence: Recurrence,
}

/// A DTSTART/DTEND value: date-only or a floating date-time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IcsTime {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl IcsTime {
    /// Parse `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`. The `Z` is stripped,
    /// not converted; the value stays floating.
    fn parse(value: &str) -> Option<IcsTime> {
        let value = value.trim();
        if value.len() == 8 {
            return NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .map(IcsTime::Date);
        }
        let value = value.strip_suffix('Z').unwrap_or(value);
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
            .ok()
            .map(IcsTime::DateTime)
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            IcsTime::Date(d) => *d,
            IcsTime::DateTime(dt) => dt.date(),
        }
    }

    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            IcsTime::Date(_) => None,
            IcsTime::DateTime(dt) => Some(dt.time()),
        }
    }
}

/// Validate file metadata before any parsing happens: `.ics`
/// extension and the size cap. Violations are validation failures,
/// never parser panics.
pub fn validate_ics_file(file_name: &str, size_bytes: u64) -> CoParentResult<()> {
    if !file_name.to_ascii_lowercase().ends_with(".ics") {
        return Err(CoParentError::Validation(format!(
            "'{}' is not an .ics file",
            file_name
        )));
    }
    if size_bytes > MAX_ICS_FILE_BYTES {
        return Err(CoParentError::Validation(format!(
            "File is too large ({} bytes, limit {} bytes)",
            size_bytes, MAX_ICS_FILE_BYTES
        )));
    }
    Ok(())
}

#[derive(Default)]
struct VEventBlock {
    summary: Option<String>,
    start: Option<IcsTime>,
    end: Option<IcsTime>,
    description: Option<String>,
    location: Option<String>,
    rrule: Option<String>,
}

/// Parse raw .ics text into the transient import records.
///
/// Recognizes `BEGIN:VEVENT`/`END:VEVENT` blocks; `VALARM` blocks and
/// everything inside them are skipped (alarms carry no occupancy
/// meaning here). An event block is only emitted when it has both a
/// non-empty title and a start date.
pub fn parse_ics(content: &str) -> Vec<IcalEvent> {
    let unfolded = unfold(content);

    let mut events = Vec::new();
    let mut block: Option<VEventBlock> = None;
    let mut in_alarm = false;

    for raw in unfolded.lines() {
        let line = raw.trim_end_matches('\r');

        match line {
            "BEGIN:VEVENT" => {
                block = Some(VEventBlock::default());
                in_alarm = false;
                continue;
            }
            "END:VEVENT" => {
                if let Some(b) = block.take() {
                    match finish_block(b) {
                        Some(event) => events.push(event),
                        None => debug!("Skipping VEVENT without title or start date"),
                    }
                }
                in_alarm = false;
                continue;
            }
            "BEGIN:VALARM" => {
                in_alarm = true;
                continue;
            }
            "END:VALARM" => {
                in_alarm = false;
                continue;
            }
            _ => {}
        }

        if in_alarm {
            continue;
        }
        let Some(block) = block.as_mut() else {
            continue;
        };
        let Some((name, value)) = split_property(line) else {
            continue;
        };

        match name {
            "SUMMARY" => block.summary = Some(unescape(value)),
            "DESCRIPTION" => block.description = non_empty(unescape(value)),
            "LOCATION" => block.location = non_empty(unescape(value)),
            "DTSTART" => block.start = IcsTime::parse(value),
            "DTEND" => block.end = IcsTime::parse(value),
            "RRULE" => block.rrule = Some(value.to_string()),
            _ => {}
        }
    }

    events
}

fn finish_block(block: VEventBlock) -> Option<IcalEvent> {
    let title = block.summary.filter(|s| !s.trim().is_empty())?;
    let start = block.start?;
    let recurrence = block
        .rrule
        .as_deref()
        .map(normalize_rrule)
        .unwrap_or(Recurrence::None);

    Some(IcalEvent {
        title,
        start,
        end: block.end,
        description: block.description,
        location: block.location,
        rrule: block.rrule,
        recurrence,
    })
}

/// Split `NAME;PARAM=...:value` into the bare property name and the
/// value. Parameter content (TZID and friends) is discarded.
fn split_property(line: &str) -> Option<(&str, &str)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next().unwrap_or(head);
    Some((name, value))
}

/// Lossy RRULE normalization: only the FREQ token is honored,
/// case-insensitively. Anything else (including a missing FREQ) maps
/// to no recurrence.
fn normalize_rrule(rrule: &str) -> Recurrence {
    let upper = rrule.to_ascii_uppercase();
    if upper.contains("FREQ=DAILY") {
        Recurrence::Daily
    } else if upper.contains("FREQ=WEEKLY") {
        Recurrence::Weekly
    } else if upper.contains("FREQ=MONTHLY") {
        Recurrence::Monthly
    } else if upper.contains("FREQ=YEARLY") {
        Recurrence::Yearly
    } else {
        Recurrence::None
    }
}

/// Remove backslash escapes from a TEXT value. `\n` becomes a real
/// newline; every other escaped character keeps only itself.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Lift parsed import records into event-creation payloads.
///
/// Defaults per the import contract: time-of-day comes from the
/// date-time value when present, else 09:00–10:00; the time zone is a
/// fixed default; the kind is always custody; the interval is fixed
/// to 1 (the RRULE's own interval was already dropped).
pub fn to_event_drafts(ical_events: &[IcalEvent], default_parent: Parent) -> Vec<EventDraft> {
    ical_events
        .iter()
        .map(|ical| {
            let start_time = ical.start.time().unwrap_or_else(|| {
                NaiveTime::from_hms_opt(DEFAULT_START_TIME.0, DEFAULT_START_TIME.1, 0)
                    .unwrap_or_default()
            });
            let end_time = ical
                .end
                .and_then(|e| e.time())
                .unwrap_or_else(|| {
                    NaiveTime::from_hms_opt(DEFAULT_END_TIME.0, DEFAULT_END_TIME.1, 0)
                        .unwrap_or_default()
                });

            EventDraft {
                title: ical.title.clone(),
                description: ical.description.clone(),
                location: ical.location.clone(),
                child_id: None,
                parent: default_parent,
                kind: EventKind::Custody,
                start_date: ical.start.date(),
                end_date: ical.end.map(|e| e.date()),
                start_time,
                end_time,
                time_zone: DEFAULT_TIME_ZONE.to_string(),
                recurrence: ical.recurrence,
                recurrence_interval: 1,
                recurrence_end: None,
                recurrence_days: vec![],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Soccer practice\r\n\
DTSTART;TZID=America/Chicago:20250401T160000\r\n\
DTEND;TZID=America/Chicago:20250401T173000\r\n\
DESCRIPTION:Bring cleats\\, water\r\n\
LOCATION:Field 3\r\n\
RRULE:FREQ=WEEKLY;BYDAY=TU\r\n\
BEGIN:VALARM\r\n\
TRIGGER:-PT30M\r\n\
ACTION:DISPLAY\r\n\
DESCRIPTION:Reminder\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_a_full_vevent_block() {
        let events = parse_ics(SAMPLE);
        assert_eq!(events.len(), 1);

        let e = &events[0];
        assert_eq!(e.title, "Soccer practice");
        assert_eq!(e.start.date(), "2025-04-01".parse().unwrap());
        assert_eq!(
            e.start.time(),
            Some(NaiveTime::from_hms_opt(16, 0, 0).unwrap())
        );
        assert_eq!(e.description.as_deref(), Some("Bring cleats, water"));
        assert_eq!(e.location.as_deref(), Some("Field 3"));
        assert_eq!(e.recurrence, Recurrence::Weekly);
    }

    #[test]
    fn valarm_contents_are_ignored_entirely() {
        let events = parse_ics(SAMPLE);
        // The alarm's DESCRIPTION:Reminder must not leak into the event.
        assert_eq!(events[0].description.as_deref(), Some("Bring cleats, water"));
    }

    #[test]
    fn block_without_summary_is_dropped_silently() {
        let ics = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
DTSTART:20250401\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Kept\r\n\
DTSTART:20250402\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let events = parse_ics(ics);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Kept");
    }

    #[test]
    fn block_without_start_is_dropped_silently() {
        let ics = "BEGIN:VEVENT\r\nSUMMARY:No start\r\nEND:VEVENT\r\n";
        assert!(parse_ics(ics).is_empty());
    }

    #[test]
    fn date_only_values_parse_without_a_time() {
        let ics = "BEGIN:VEVENT\r\nSUMMARY:Spring break\r\nDTSTART:20250317\r\nDTEND:20250321\r\nEND:VEVENT\r\n";
        let events = parse_ics(ics);
        assert_eq!(events[0].start, IcsTime::Date("2025-03-17".parse().unwrap()));
        assert_eq!(events[0].start.time(), None);
    }

    #[test]
    fn utc_marker_is_stripped_not_converted() {
        let ics = "BEGIN:VEVENT\r\nSUMMARY:Call\r\nDTSTART:20250401T183000Z\r\nEND:VEVENT\r\n";
        let events = parse_ics(ics);
        // 18:30 stays 18:30; the Z never shifts the clock.
        assert_eq!(
            events[0].start.time(),
            Some(NaiveTime::from_hms_opt(18, 30, 0).unwrap())
        );
    }

    #[test]
    fn malformed_date_value_drops_the_block() {
        let ics = "BEGIN:VEVENT\r\nSUMMARY:Bad\r\nDTSTART:not-a-date\r\nEND:VEVENT\r\n";
        assert!(parse_ics(ics).is_empty());
    }

    #[test]
    fn rrule_normalization_keeps_only_freq() {
        let freqs = [
            ("FREQ=DAILY", Recurrence::Daily),
            ("freq=weekly;interval=2;byday=MO", Recurrence::Weekly),
            ("FREQ=MONTHLY;BYMONTHDAY=15", Recurrence::Monthly),
            ("FREQ=YEARLY", Recurrence::Yearly),
            ("FREQ=HOURLY", Recurrence::None),
            ("INTERVAL=2", Recurrence::None),
        ];
        for (rrule, expected) in freqs {
            let ics = format!(
                "BEGIN:VEVENT\r\nSUMMARY:R\r\nDTSTART:20250401\r\nRRULE:{}\r\nEND:VEVENT\r\n",
                rrule
            );
            let events = parse_ics(&ics);
            assert_eq!(events[0].recurrence, expected, "rrule {}", rrule);
        }
    }

    #[test]
    fn folded_lines_are_unfolded_before_scanning() {
        let ics = "BEGIN:VEVENT\r\n\
SUMMARY:A very long su\r\n mmary line\r\n\
DTSTART:20250401\r\n\
END:VEVENT\r\n";
        let events = parse_ics(ics);
        assert_eq!(events[0].title, "A very long summary line");
    }

    #[test]
    fn validate_rejects_wrong_extension() {
        assert!(validate_ics_file("schedule.txt", 1024).is_err());
        assert!(validate_ics_file("schedule.ICS", 1024).is_ok());
    }

    #[test]
    fn validate_rejects_oversized_files() {
        assert!(validate_ics_file("schedule.ics", 11 * 1024 * 1024).is_err());
        assert!(validate_ics_file("schedule.ics", MAX_ICS_FILE_BYTES).is_ok());
    }

    #[test]
    fn drafts_default_times_when_import_is_date_only() {
        let ics = "BEGIN:VEVENT\r\nSUMMARY:Break\r\nDTSTART:20250317\r\nDTEND:20250321\r\nEND:VEVENT\r\n";
        let drafts = to_event_drafts(&parse_ics(ics), Parent::B);
        assert_eq!(drafts.len(), 1);

        let d = &drafts[0];
        assert_eq!(d.parent, Parent::B);
        assert_eq!(d.kind, EventKind::Custody);
        assert_eq!(d.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(d.end_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(d.end_date, Some("2025-03-21".parse().unwrap()));
        assert_eq!(d.time_zone, DEFAULT_TIME_ZONE);
        assert_eq!(d.recurrence_interval, 1);
    }

    #[test]
    fn drafts_carry_the_imported_time_of_day() {
        let drafts = to_event_drafts(&parse_ics(SAMPLE), Parent::A);
        assert_eq!(
            drafts[0].start_time,
            NaiveTime::from_hms_opt(16, 0, 0).unwrap()
        );
        assert_eq!(
            drafts[0].end_time,
            NaiveTime::from_hms_opt(17, 30, 0).unwrap()
        );
        assert_eq!(drafts[0].recurrence, Recurrence::Weekly);
    }
}
