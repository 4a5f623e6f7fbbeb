//! JSON-file event store.
//!
//! Events live in a single pretty-printed `events.json` next to the
//! config. Ids are monotonically assigned and never reused, so
//! "highest id" stays a valid proxy for "most recently created" even
//! after deletions.

use async_trait::async_trait;
use chrono::Utc;
use coparent_core::{
    expand, CoParentError, CoParentResult, DateRange, Event, EventDraft, EventPatch, EventStore,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    events: Vec<Event>,
}

pub struct JsonStore {
    path: PathBuf,
    next_id: u64,
    events: Vec<Event>,
}

impl JsonStore {
    /// Open the store at `path`, creating an empty one on first use.
    pub fn open(path: PathBuf) -> CoParentResult<Self> {
        if !path.exists() {
            return Ok(JsonStore {
                path,
                next_id: 1,
                events: Vec::new(),
            });
        }

        let contents = std::fs::read_to_string(&path)?;
        let file: StoreFile = serde_json::from_str(&contents)
            .map_err(|e| CoParentError::Serialization(e.to_string()))?;

        let highest = file.events.iter().map(|e| e.id).max().unwrap_or(0);
        Ok(JsonStore {
            path,
            next_id: file.next_id.max(highest + 1),
            events: file.events,
        })
    }

    fn persist(&self) -> CoParentResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = StoreFile {
            next_id: self.next_id,
            events: self.events.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| CoParentError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}

#[async_trait]
impl EventStore for JsonStore {
    async fn list_events(&self, window: &DateRange) -> CoParentResult<Vec<Event>> {
        Ok(self
            .events
            .iter()
            .filter(|e| !expand(e, window).is_empty())
            .cloned()
            .collect())
    }

    async fn create_event(&mut self, draft: EventDraft) -> CoParentResult<Event> {
        let draft = draft.validated()?;
        let id = self.next_id;
        self.next_id += 1;

        let event = draft.into_event(id, Utc::now());
        self.events.push(event.clone());
        self.persist()?;
        Ok(event)
    }

    async fn update_event(&mut self, id: u64, patch: EventPatch) -> CoParentResult<Event> {
        let slot = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CoParentError::EventNotFound(id))?;
        *slot = slot.with_patch(patch)?;
        let updated = slot.clone();
        self.persist()?;
        Ok(updated)
    }

    async fn delete_event(&mut self, id: u64) -> CoParentResult<()> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            return Err(CoParentError::EventNotFound(id));
        }
        self.persist()?;
        Ok(())
    }
}
