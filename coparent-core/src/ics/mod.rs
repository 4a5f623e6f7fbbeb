//! ICS (RFC 5545 subset) import and export.
//!
//! Only `VEVENT` blocks with `SUMMARY`, `DTSTART`, `DTEND`,
//! `DESCRIPTION`, `LOCATION` and `RRULE` are meaningful here; all
//! other properties and components (`VTIMEZONE`, `VALARM` contents,
//! `VTODO`, ...) are ignored.

mod generate;
mod parse;

pub use generate::{export_filename, export_ics, PRODID};
pub use parse::{
    parse_ics, to_event_drafts, validate_ics_file, IcalEvent, IcsTime, MAX_ICS_FILE_BYTES,
};
