//! The persistence seam and best-effort batch import.
//!
//! The engine itself never talks to storage; callers hand it events
//! they already fetched. `EventStore` is the narrow interface a
//! backing store implements (a JSON file in the CLI, anything
//! elsewhere), and `import_drafts` drives it for multi-event ICS
//! imports.

use async_trait::async_trait;
use log::{debug, warn};

use crate::date_range::DateRange;
use crate::error::CoParentResult;
use crate::event::{Event, EventDraft, EventPatch};

/// Persistence operations the calendar engine's callers need.
#[async_trait]
pub trait EventStore {
    /// Events whose expansion could intersect the window. Returning a
    /// superset is fine; expansion re-filters per day.
    async fn list_events(&self, window: &DateRange) -> CoParentResult<Vec<Event>>;

    /// Persist a draft, assigning identity. The draft must already be
    /// validated; stores may re-validate but are not required to.
    async fn create_event(&mut self, draft: EventDraft) -> CoParentResult<Event>;

    async fn update_event(&mut self, id: u64, patch: EventPatch) -> CoParentResult<Event>;

    async fn delete_event(&mut self, id: u64) -> CoParentResult<()>;
}

/// Outcome of a multi-event import. Partial success is an expected,
/// reported state, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOutcome {
    pub created: usize,
    pub failed: usize,
}

impl ImportOutcome {
    /// The user-facing summary line. Raw error text never surfaces.
    pub fn summary(&self) -> String {
        if self.failed == 0 {
            format!("Successfully imported {} events", self.created)
        } else {
            format!(
                "Successfully imported {} events ({} failed)",
                self.created, self.failed
            )
        }
    }
}

/// Persist each draft independently: no transaction wraps the batch,
/// a failed creation is counted and the rest continue. Invalid drafts
/// count as failures the same way storage rejections do.
pub async fn import_drafts<S: EventStore + Send>(
    store: &mut S,
    drafts: Vec<EventDraft>,
) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();

    for draft in drafts {
        let validated = match draft.validated() {
            Ok(d) => d,
            Err(err) => {
                warn!("Skipping invalid imported event: {}", err);
                outcome.failed += 1;
                continue;
            }
        };

        match store.create_event(validated).await {
            Ok(event) => {
                debug!("Imported event {} '{}'", event.id, event.title);
                outcome.created += 1;
            }
            Err(err) => {
                warn!("Failed to persist imported event: {}", err);
                outcome.failed += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoParentError;
    use crate::event::{EventKind, Parent, Recurrence, DEFAULT_TIME_ZONE};
    use chrono::{NaiveTime, Utc};

    /// In-memory store that can be told to fail specific creations.
    struct MemStore {
        events: Vec<Event>,
        next_id: u64,
        fail_on: Vec<u64>,
    }

    impl MemStore {
        fn new(fail_on: Vec<u64>) -> Self {
            MemStore {
                events: Vec::new(),
                next_id: 1,
                fail_on,
            }
        }
    }

    #[async_trait]
    impl EventStore for MemStore {
        async fn list_events(&self, _window: &DateRange) -> CoParentResult<Vec<Event>> {
            Ok(self.events.clone())
        }

        async fn create_event(&mut self, draft: EventDraft) -> CoParentResult<Event> {
            let id = self.next_id;
            self.next_id += 1;
            if self.fail_on.contains(&id) {
                return Err(CoParentError::Store("storage unavailable".into()));
            }
            let event = draft.into_event(id, Utc::now());
            self.events.push(event.clone());
            Ok(event)
        }

        async fn update_event(&mut self, id: u64, patch: EventPatch) -> CoParentResult<Event> {
            let slot = self
                .events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or(CoParentError::EventNotFound(id))?;
            *slot = slot.with_patch(patch)?;
            Ok(slot.clone())
        }

        async fn delete_event(&mut self, id: u64) -> CoParentResult<()> {
            let before = self.events.len();
            self.events.retain(|e| e.id != id);
            if self.events.len() == before {
                return Err(CoParentError::EventNotFound(id));
            }
            Ok(())
        }
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            description: None,
            location: None,
            child_id: None,
            parent: Parent::A,
            kind: EventKind::Custody,
            start_date: "2025-04-01".parse().unwrap(),
            end_date: None,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            recurrence: Recurrence::None,
            recurrence_interval: 1,
            recurrence_end: None,
            recurrence_days: vec![],
        }
    }

    #[tokio::test]
    async fn import_continues_past_a_failing_creation() {
        // The second creation fails; first and third still land.
        let mut store = MemStore::new(vec![2]);
        let drafts = vec![draft("one"), draft("two"), draft("three")];

        let outcome = import_drafts(&mut store, drafts).await;
        assert_eq!(outcome, ImportOutcome { created: 2, failed: 1 });

        let titles: Vec<&str> = store.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn import_counts_invalid_drafts_as_failures() {
        let mut store = MemStore::new(vec![]);
        let mut bad = draft("bad");
        bad.recurrence = Recurrence::Weekly;
        bad.recurrence_days = vec![9];

        let outcome = import_drafts(&mut store, vec![draft("good"), bad]).await;
        assert_eq!(outcome, ImportOutcome { created: 1, failed: 1 });
    }

    #[tokio::test]
    async fn outcome_summary_reads_like_a_status_line() {
        assert_eq!(
            ImportOutcome { created: 4, failed: 0 }.summary(),
            "Successfully imported 4 events"
        );
        assert_eq!(
            ImportOutcome { created: 2, failed: 1 }.summary(),
            "Successfully imported 2 events (1 failed)"
        );
    }

    #[tokio::test]
    async fn update_revalidates_and_delete_removes() {
        let mut store = MemStore::new(vec![]);
        let outcome = import_drafts(&mut store, vec![draft("custody")]).await;
        assert_eq!(outcome.created, 1);

        let patch = EventPatch {
            recurrence: Some(Recurrence::Biweekly),
            ..Default::default()
        };
        let updated = store.update_event(1, patch).await.unwrap();
        assert_eq!(updated.recurrence, Recurrence::Weekly);
        assert_eq!(updated.recurrence_interval, 2);

        store.delete_event(1).await.unwrap();
        assert!(matches!(
            store.delete_event(1).await,
            Err(CoParentError::EventNotFound(1))
        ));
    }
}
