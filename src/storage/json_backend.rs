use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;
use uuid::Uuid;

use super::{
    memory::{CalendarSnapshot, InMemoryStore},
    EventStore, Result,
};
use crate::{
    calendar::{Event, EventCandidate, EventType, Occupancy, OwnerRef},
    errors::CalendarError,
    utils::paths::write_atomic,
};

/// Event store persisted to a single JSON document.
///
/// Every mutation is written through immediately. When the write fails the in-memory
/// change is rolled back, so the store never reports an entry the file does not hold.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonStore {
    /// Opens the store at `path`; a missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = if path.exists() {
            InMemoryStore::from_snapshot(load_snapshot_from_path(&path)?)
        } else {
            InMemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn add_event_type(&mut self, event_type: EventType) -> Result<Uuid> {
        let id = event_type.id;
        let displaced = self.inner.put_event_type(event_type);
        if let Err(err) = self.flush() {
            match displaced {
                Some(previous) => {
                    self.inner.put_event_type(previous);
                }
                None => {
                    self.inner.remove_event_type(id);
                }
            }
            return Err(err);
        }
        Ok(id)
    }

    pub fn insert(&mut self, event: Event) -> Result<Uuid> {
        let id = self.inner.insert(event);
        if let Err(err) = self.flush() {
            self.inner.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Writes the current state to disk.
    pub fn flush(&self) -> Result<()> {
        save_snapshot_to_path(&self.inner.snapshot(), &self.path)?;
        debug!(path = %self.path.display(), events = self.inner.len(), "event store saved");
        Ok(())
    }
}

impl EventStore for JsonStore {
    fn event(&self, id: Uuid) -> Result<Option<Event>> {
        self.inner.event(id)
    }

    fn event_type(&self, id: Uuid) -> Result<Option<EventType>> {
        self.inner.event_type(id)
    }

    fn all_events(&self) -> Result<Vec<Event>> {
        self.inner.all_events()
    }

    fn existing_owned_events(&self, owner: &OwnerRef) -> Result<Vec<Event>> {
        self.inner.existing_owned_events(owner)
    }

    fn has_conflict(&self, subject: &Occupancy<'_>) -> Result<bool> {
        self.inner.has_conflict(subject)
    }

    fn conflicting_events(&self, subject: &Occupancy<'_>) -> Result<Vec<Event>> {
        self.inner.conflicting_events(subject)
    }

    fn create(&mut self, candidate: &EventCandidate) -> Result<Event> {
        let event = self.inner.create(candidate)?;
        if let Err(err) = self.flush() {
            self.inner.remove(event.id);
            return Err(err);
        }
        Ok(event)
    }

    fn update(&mut self, event: &Event) -> Result<()> {
        let previous = self
            .inner
            .event(event.id)?
            .ok_or(CalendarError::EventNotFound(event.id))?;
        self.inner.update(event)?;
        if let Err(err) = self.flush() {
            self.inner.replace(previous);
            return Err(err);
        }
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        let removed = self
            .inner
            .remove(id)
            .ok_or(CalendarError::EventNotFound(id))?;
        if let Err(err) = self.flush() {
            self.inner.insert(removed);
            return Err(err);
        }
        Ok(())
    }
}

pub fn save_snapshot_to_path(snapshot: &CalendarSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    write_atomic(path, &json)?;
    Ok(())
}

pub fn load_snapshot_from_path(path: &Path) -> Result<CalendarSnapshot> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|err| CalendarError::Storage(format!("{}: {}", path.display(), err)))
}
