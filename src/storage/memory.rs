use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventStore, Result};
use crate::{
    calendar::{conflict, Event, EventCandidate, EventType, Occupancy, OwnerRef},
    errors::CalendarError,
};

/// Serializable image of a store: entry types plus entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarSnapshot {
    #[serde(default)]
    pub event_types: Vec<EventType>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Event store keeping everything in memory; conflict questions are answered by
/// scanning all entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    events: Vec<Event>,
    event_types: HashMap<Uuid, EventType>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CalendarSnapshot) -> Self {
        Self {
            events: snapshot.events,
            event_types: snapshot
                .event_types
                .into_iter()
                .map(|event_type| (event_type.id, event_type))
                .collect(),
        }
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        let mut event_types: Vec<EventType> = self.event_types.values().cloned().collect();
        event_types.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        CalendarSnapshot {
            event_types,
            events: self.events.clone(),
        }
    }

    pub fn add_event_type(&mut self, event_type: EventType) -> Uuid {
        let id = event_type.id;
        self.event_types.insert(id, event_type);
        id
    }

    /// Stores an entry as is (e.g. a manually created appointment).
    pub fn insert(&mut self, event: Event) -> Uuid {
        let id = event.id;
        self.events.push(event);
        id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: Uuid) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn remove(&mut self, id: Uuid) -> Option<Event> {
        let index = self.events.iter().position(|event| event.id == id)?;
        Some(self.events.remove(index))
    }

    /// Stores `event_type`, handing back the one it displaced.
    pub(crate) fn put_event_type(&mut self, event_type: EventType) -> Option<EventType> {
        self.event_types.insert(event_type.id, event_type)
    }

    pub(crate) fn remove_event_type(&mut self, id: Uuid) -> Option<EventType> {
        self.event_types.remove(&id)
    }

    pub(crate) fn replace(&mut self, event: Event) -> Option<Event> {
        let slot = self.events.iter_mut().find(|stored| stored.id == event.id)?;
        Some(std::mem::replace(slot, event))
    }
}

impl EventStore for InMemoryStore {
    fn event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.get(id).cloned())
    }

    fn event_type(&self, id: Uuid) -> Result<Option<EventType>> {
        Ok(self.event_types.get(&id).cloned())
    }

    fn all_events(&self) -> Result<Vec<Event>> {
        Ok(self.events.clone())
    }

    fn existing_owned_events(&self, owner: &OwnerRef) -> Result<Vec<Event>> {
        let mut owned: Vec<Event> = self
            .events
            .iter()
            .filter(|event| event.sequence_number.is_some() && event.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by_key(|event| (event.start_date, event.start_time, event.sequence_number));
        Ok(owned)
    }

    fn has_conflict(&self, subject: &Occupancy<'_>) -> Result<bool> {
        Ok(conflict::has_conflict(subject, &self.events, &self.event_types))
    }

    fn conflicting_events(&self, subject: &Occupancy<'_>) -> Result<Vec<Event>> {
        let mut conflicts: Vec<Event> =
            conflict::conflicting_events(subject, &self.events, &self.event_types)
                .into_iter()
                .cloned()
                .collect();
        conflicts.sort_by_key(|event| (event.start_date, event.start_time));
        Ok(conflicts)
    }

    fn create(&mut self, candidate: &EventCandidate) -> Result<Event> {
        let mut event = Event::from_candidate(candidate);
        if self.get(event.id).is_some() {
            event.id = Uuid::new_v4();
        }
        self.events.push(event.clone());
        Ok(event)
    }

    fn update(&mut self, event: &Event) -> Result<()> {
        self.replace(event.clone())
            .map(|_| ())
            .ok_or(CalendarError::EventNotFound(event.id))
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        self.remove(id)
            .map(|_| ())
            .ok_or(CalendarError::EventNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn owned_events_are_sorted_and_filtered() {
        let owner = OwnerRef::new("reservation", Uuid::new_v4());
        let mut store = InMemoryStore::new();
        for (seq, day) in [(3, 8), (1, 1), (2, 3)] {
            store
                .create(&EventCandidate::new(owner.clone(), seq, date(day)))
                .unwrap();
        }
        store.insert(Event::new("Manual", date(2)));
        let other = OwnerRef::new("reservation", Uuid::new_v4());
        store.create(&EventCandidate::new(other, 1, date(1))).unwrap();

        let owned = store.existing_owned_events(&owner).unwrap();
        let sequence: Vec<_> = owned.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequence, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn same_day_events_order_by_time_then_sequence() {
        let owner = OwnerRef::new("course", Uuid::new_v4());
        let mut store = InMemoryStore::new();
        let mut late = EventCandidate::new(owner.clone(), 1, date(1));
        late.start_time = NaiveTime::from_hms_opt(14, 0, 0);
        let mut early = EventCandidate::new(owner.clone(), 2, date(1));
        early.start_time = NaiveTime::from_hms_opt(9, 0, 0);
        store.create(&late).unwrap();
        store.create(&early).unwrap();

        let owned = store.existing_owned_events(&owner).unwrap();
        assert_eq!(owned[0].sequence_number, Some(2));
    }

    #[test]
    fn update_and_delete_unknown_events_fail() {
        let mut store = InMemoryStore::new();
        let stray = Event::new("Stray", date(1));
        assert!(matches!(
            store.update(&stray),
            Err(CalendarError::EventNotFound(id)) if id == stray.id
        ));
        assert!(store.delete(stray.id).is_err());
    }

    #[test]
    fn snapshot_restores_store() {
        let mut store = InMemoryStore::new();
        let holiday = store.add_event_type(EventType::new("Holiday").locking_all_rooms());
        store.insert(Event::new("New Year", date(1)).with_type(holiday));
        let restored = InMemoryStore::from_snapshot(store.snapshot());
        assert_eq!(restored.len(), 1);
        assert!(restored.event_type(holiday).unwrap().unwrap().all_rooms);
    }
}
