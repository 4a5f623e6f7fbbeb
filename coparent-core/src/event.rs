//! Custody calendar event types.
//!
//! These types are the single internal representation of an event.
//! Anything crossing a boundary (the JSON store, an imported .ics
//! file, CLI flags) is lifted into an [`EventDraft`], validated, and
//! only then becomes an [`Event`]. The expansion engine assumes it is
//! handed validated events and never re-checks recurrence fields.
//!
//! Times are "floating" local times tied to the stored `time_zone`
//! name. They are never converted to or from UTC instants, so two
//! events with different zones are not comparable on an absolute
//! timeline. This mirrors the on-disk semantics of the data this tool
//! exchanges and is a known limitation, not an oversight.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoParentError, CoParentResult};

/// Time zone assigned to imported events that carry none.
pub const DEFAULT_TIME_ZONE: &str = "America/New_York";

/// Default time-of-day span for imported date-only events.
pub const DEFAULT_START_TIME: (u32, u32) = (9, 0);
pub const DEFAULT_END_TIME: (u32, u32) = (10, 0);

/// One of the two custody parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parent {
    A,
    B,
}

impl std::fmt::Display for Parent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parent::A => write!(f, "A"),
            Parent::B => write!(f, "B"),
        }
    }
}

impl std::str::FromStr for Parent {
    type Err = CoParentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Parent::A),
            "B" | "b" => Ok(Parent::B),
            other => Err(CoParentError::Validation(format!(
                "Unknown parent '{}'. Expected A or B",
                other
            ))),
        }
    }
}

/// What kind of calendar entry this is.
///
/// Non-custody kinds are "exceptional" for display purposes: they win
/// the per-day tie-break against plain custody assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Custody,
    Holiday,
    Activity,
    Travel,
}

impl EventKind {
    /// Holidays, travel and activities take display precedence over
    /// plain custody assignments.
    pub fn is_exceptional(self) -> bool {
        self != EventKind::Custody
    }

    /// One-letter marker for compact calendar cells.
    pub fn marker(self) -> char {
        match self {
            EventKind::Custody => 'C',
            EventKind::Holiday => 'H',
            EventKind::Activity => 'V',
            EventKind::Travel => 'T',
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = CoParentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "custody" => Ok(EventKind::Custody),
            "holiday" => Ok(EventKind::Holiday),
            "activity" => Ok(EventKind::Activity),
            "travel" => Ok(EventKind::Travel),
            other => Err(CoParentError::Validation(format!(
                "Unknown event kind '{}'. Expected custody, holiday, activity or travel",
                other
            ))),
        }
    }
}

/// Recurrence tag as it appears on the wire.
///
/// `Biweekly` and `Custom` exist only at the boundary: validation
/// canonicalizes `Biweekly` to `Weekly` with interval 2, and `Custom`
/// to `Weekly` with explicit days. The expansion engine never sees
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    Custom,
}

impl Recurrence {
    pub fn is_recurring(self) -> bool {
        self != Recurrence::None
    }
}

impl std::str::FromStr for Recurrence {
    type Err = CoParentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" => Ok(Recurrence::Yearly),
            "custom" => Ok(Recurrence::Custom),
            other => Err(CoParentError::Validation(format!(
                "Unknown recurrence '{}'",
                other
            ))),
        }
    }
}

/// A persisted calendar event. Created exclusively by a store from a
/// validated [`EventDraft`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Dependent this event applies to; `None` means all children.
    pub child_id: Option<u64>,
    pub parent: Parent,
    pub kind: EventKind,
    /// Inclusive calendar-date range occupied by a single occurrence.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Local time-of-day, identical for every expanded occurrence.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// IANA zone name the times are local to (validated, never applied).
    pub time_zone: String,
    pub recurrence: Recurrence,
    pub recurrence_interval: u32,
    /// No occurrence starts after this date.
    pub recurrence_end: Option<NaiveDate>,
    /// Weekday indices (0=Sunday..6=Saturday) for weekly recurrence.
    pub recurrence_days: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Days beyond `start_date` that each occurrence spans.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Apply a partial update and re-validate. Recurrence changes take
    /// effect on the next expansion; nothing is materialized eagerly.
    pub fn with_patch(&self, patch: EventPatch) -> CoParentResult<Event> {
        let draft = EventDraft {
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            description: patch.description.unwrap_or_else(|| self.description.clone()),
            location: patch.location.unwrap_or_else(|| self.location.clone()),
            child_id: patch.child_id.unwrap_or(self.child_id),
            parent: patch.parent.unwrap_or(self.parent),
            kind: patch.kind.unwrap_or(self.kind),
            start_date: patch.start_date.unwrap_or(self.start_date),
            end_date: Some(patch.end_date.unwrap_or(self.end_date)),
            start_time: patch.start_time.unwrap_or(self.start_time),
            end_time: patch.end_time.unwrap_or(self.end_time),
            time_zone: patch.time_zone.unwrap_or_else(|| self.time_zone.clone()),
            recurrence: patch.recurrence.unwrap_or(self.recurrence),
            recurrence_interval: patch.recurrence_interval.unwrap_or(self.recurrence_interval),
            recurrence_end: patch.recurrence_end.unwrap_or(self.recurrence_end),
            recurrence_days: patch
                .recurrence_days
                .unwrap_or_else(|| self.recurrence_days.clone()),
        };
        let draft = draft.validated()?;
        Ok(draft.into_event(self.id, self.created_at))
    }
}

/// An event-creation payload: everything except the identity the
/// store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub child_id: Option<u64>,
    pub parent: Parent,
    pub kind: EventKind,
    pub start_date: NaiveDate,
    /// Defaults to `start_date` when absent.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub time_zone: String,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    #[serde(default)]
    pub recurrence_end: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence_days: Vec<u8>,
}

fn default_interval() -> u32 {
    1
}

impl EventDraft {
    /// Validate and canonicalize the draft.
    ///
    /// Rejections happen here, at creation/update time, never inside
    /// expansion:
    /// - `end_date` before `start_date`
    /// - `recurrence_interval` of zero
    /// - `recurrence_days` outside 0..=6
    /// - `time_zone` not in the IANA database
    ///
    /// Canonicalization:
    /// - absent `end_date` becomes `start_date`
    /// - `biweekly` becomes `weekly` with interval 2
    /// - `custom` becomes `weekly` (it only ever meant weekly-with-days)
    /// - `recurrence_days` are sorted and deduplicated
    pub fn validated(mut self) -> CoParentResult<EventDraft> {
        if self.title.trim().is_empty() {
            return Err(CoParentError::Validation("Event title is empty".into()));
        }

        let end = self.end_date.unwrap_or(self.start_date);
        if end < self.start_date {
            return Err(CoParentError::Validation(format!(
                "End date {} is before start date {}",
                end, self.start_date
            )));
        }
        self.end_date = Some(end);

        if self.time_zone.parse::<chrono_tz::Tz>().is_err() {
            return Err(CoParentError::Validation(format!(
                "Unknown time zone '{}'",
                self.time_zone
            )));
        }

        if self.recurrence.is_recurring() {
            if self.recurrence_interval == 0 {
                return Err(CoParentError::Validation(
                    "Recurrence interval must be at least 1".into(),
                ));
            }
            if let Some(bad) = self.recurrence_days.iter().find(|d| **d > 6) {
                return Err(CoParentError::Validation(format!(
                    "Recurrence weekday index {} is out of range (0=Sunday..6=Saturday)",
                    bad
                )));
            }
            self.recurrence_days.sort_unstable();
            self.recurrence_days.dedup();
        } else {
            self.recurrence_interval = 1;
            self.recurrence_end = None;
            self.recurrence_days.clear();
        }

        // Two tags, one meaning: fold boundary-only variants into weekly.
        match self.recurrence {
            Recurrence::Biweekly => {
                self.recurrence = Recurrence::Weekly;
                self.recurrence_interval = 2;
            }
            Recurrence::Custom => {
                self.recurrence = Recurrence::Weekly;
            }
            _ => {}
        }

        Ok(self)
    }

    /// Attach store-assigned identity. `end_date` must already be
    /// filled in by [`EventDraft::validated`].
    pub fn into_event(self, id: u64, created_at: DateTime<Utc>) -> Event {
        let end_date = self.end_date.unwrap_or(self.start_date);
        Event {
            id,
            title: self.title,
            description: self.description,
            location: self.location,
            child_id: self.child_id,
            parent: self.parent,
            kind: self.kind,
            start_date: self.start_date,
            end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            time_zone: self.time_zone,
            recurrence: self.recurrence,
            recurrence_interval: self.recurrence_interval,
            recurrence_end: self.recurrence_end,
            recurrence_days: self.recurrence_days,
            created_at,
        }
    }
}

/// A partial update. `None` leaves the field untouched; the outer
/// `Option` on optional fields allows clearing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub child_id: Option<Option<u64>>,
    pub parent: Option<Parent>,
    pub kind: Option<EventKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub time_zone: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_interval: Option<u32>,
    pub recurrence_end: Option<Option<NaiveDate>>,
    pub recurrence_days: Option<Vec<u8>>,
}
