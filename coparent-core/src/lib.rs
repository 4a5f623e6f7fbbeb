//! Custody calendar engine for the coparent ecosystem.
//!
//! This crate holds the whole computational core shared by coparent
//! front-ends:
//! - `event`: the internal event representation plus validation
//! - `recurrence`: expansion of recurring events into per-day
//!   occupancy and the display tie-break for a calendar cell
//! - `ics`: import from and export to the RFC 5545 subset the app
//!   exchanges with other calendars
//! - `store`: the persistence seam and best-effort batch import
//!
//! Everything here is pure computation over already-fetched data; the
//! enclosing application owns I/O, auth, and timeouts.

pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod recurrence;
pub mod store;

pub use date_range::DateRange;
pub use error::{CoParentError, CoParentResult};
pub use event::{Event, EventDraft, EventKind, EventPatch, Parent, Recurrence};
pub use recurrence::{events_on_day, expand, occupies, resolve_day};
pub use store::{import_drafts, EventStore, ImportOutcome};
