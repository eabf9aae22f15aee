pub mod json_backend;
pub mod memory;

use uuid::Uuid;

use crate::{
    calendar::{Event, EventCandidate, EventType, Occupancy, OwnerRef},
    errors::CalendarError,
};

pub type Result<T> = std::result::Result<T, CalendarError>;

/// Persistent home of calendar entries. The reconciler reads owned entries and asks
/// conflict questions through it, and issues every create/update/delete through it.
pub trait EventStore: Send {
    fn event(&self, id: Uuid) -> Result<Option<Event>>;
    fn event_type(&self, id: Uuid) -> Result<Option<EventType>>;
    fn all_events(&self) -> Result<Vec<Event>>;

    /// Entries generated for `owner` (non-null sequence number), ordered by
    /// start date, start time and sequence number.
    fn existing_owned_events(&self, owner: &OwnerRef) -> Result<Vec<Event>>;

    fn has_conflict(&self, subject: &Occupancy<'_>) -> Result<bool>;
    fn conflicting_events(&self, subject: &Occupancy<'_>) -> Result<Vec<Event>>;

    fn create(&mut self, candidate: &EventCandidate) -> Result<Event>;
    fn update(&mut self, event: &Event) -> Result<()>;
    fn delete(&mut self, id: Uuid) -> Result<()>;
}

pub use json_backend::JsonStore;
pub use memory::{CalendarSnapshot, InMemoryStore};
