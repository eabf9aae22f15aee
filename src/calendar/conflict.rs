//! Overlap rules deciding whether two calendar entries compete for the same slot.
//!
//! The predicate is evaluated against a subject (a persisted [`Event`] or a generated
//! [`EventCandidate`]) and an iterator of stored events. Stores call into this module;
//! the reconciler only sees the resulting `has_conflict`/`conflicting_events` answers.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use super::{
    event::{EntryState, Event, EventCandidate, OwnerRef},
    event_type::EventType,
};

/// Lookup of event types by id.
pub trait EventTypes {
    fn get_type(&self, id: Uuid) -> Option<&EventType>;
}

impl EventTypes for HashMap<Uuid, EventType> {
    fn get_type(&self, id: Uuid) -> Option<&EventType> {
        self.get(&id)
    }
}

/// The scheduling-relevant fields of an entry.
#[derive(Debug, Clone, Copy)]
pub struct Occupancy<'a> {
    pub id: Option<Uuid>,
    pub owner: Option<&'a OwnerRef>,
    pub generated: bool,
    pub state: EntryState,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: Option<Uuid>,
    pub room: Option<Uuid>,
    pub user: Option<Uuid>,
    pub transparent: bool,
}

impl<'a> From<&'a Event> for Occupancy<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            id: Some(event.id),
            owner: event.owner.as_ref(),
            generated: event.sequence_number.is_some(),
            state: event.state,
            start_date: event.start_date,
            end_date: event.end_date,
            start_time: event.start_time,
            end_time: event.end_time,
            event_type: event.event_type,
            room: event.room,
            user: event.user,
            transparent: event.transparent,
        }
    }
}

impl<'a> From<&'a EventCandidate> for Occupancy<'a> {
    fn from(candidate: &'a EventCandidate) -> Self {
        Self {
            id: candidate.event_id,
            owner: Some(&candidate.owner),
            generated: true,
            state: candidate.state,
            start_date: candidate.start_date,
            end_date: candidate.end_date,
            start_time: candidate.start_time,
            end_time: candidate.end_time,
            event_type: candidate.event_type,
            room: candidate.room,
            user: candidate.user,
            transparent: candidate.transparent,
        }
    }
}

impl Occupancy<'_> {
    fn last_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }

    fn is_single_day(&self) -> bool {
        self.last_date() == self.start_date
    }

    fn shares_owner_with(&self, other: &Event) -> bool {
        self.owner.is_some() && other.owner.as_ref() == self.owner
    }
}

/// Stored events that compete with `subject` for its slot.
pub fn conflicting_events<'e, T>(
    subject: &Occupancy<'_>,
    events: impl IntoIterator<Item = &'e Event>,
    types: &T,
) -> Vec<&'e Event>
where
    T: EventTypes + ?Sized,
{
    if subject.transparent {
        return Vec::new();
    }
    // An ownerless entry in a transparent state (cancelled, omitted) blocks nothing.
    if subject.owner.is_none() && subject.state.is_transparent() {
        return Vec::new();
    }
    let subject_type = subject.event_type.and_then(|id| types.get_type(id));
    events
        .into_iter()
        .filter(|other| competes(subject, subject_type, other, types))
        .collect()
}

/// Whether `subject` cannot be scheduled as is, given its type's tolerance for
/// simultaneous entries.
pub fn has_conflict<'e, T>(
    subject: &Occupancy<'_>,
    events: impl IntoIterator<Item = &'e Event>,
    types: &T,
) -> bool
where
    T: EventTypes + ?Sized,
{
    if subject.transparent {
        return false;
    }
    let subject_type = subject.event_type.and_then(|id| types.get_type(id));
    if subject_type.is_some_and(|t| t.transparent) {
        return false;
    }
    let conflicts = conflicting_events(subject, events, types);
    let tolerated = match subject_type {
        Some(event_type) => {
            // Holidays conflict even with types that tolerate simultaneous entries.
            let all_rooms = conflicts.iter().any(|other| {
                other
                    .event_type
                    .and_then(|id| types.get_type(id))
                    .is_some_and(|t| t.all_rooms)
            });
            if all_rooms {
                return true;
            }
            event_type.max_conflicting.saturating_sub(1) as usize
        }
        None => 0,
    };
    conflicts.len() > tolerated
}

fn competes<T>(
    subject: &Occupancy<'_>,
    subject_type: Option<&EventType>,
    other: &Event,
    types: &T,
) -> bool
where
    T: EventTypes + ?Sized,
{
    let other_type = other.event_type.and_then(|id| types.get_type(id));
    if other.transparent || other_type.is_some_and(|t| t.transparent) {
        return false;
    }
    if subject.id == Some(other.id) {
        return false;
    }
    if !dates_overlap(subject, other) || !times_overlap(subject, other) {
        return false;
    }

    let same_owner = subject.shares_owner_with(other);
    // Generated siblings never conflict with each other.
    if subject.generated && other.sequence_number.is_some() && same_owner {
        return false;
    }

    let state_blocks = match subject.owner {
        None => !other.state.is_transparent(),
        Some(_) if subject.state.is_transparent() => same_owner,
        Some(_) => !other.state.is_transparent() || same_owner,
    };
    if !state_blocks {
        return false;
    }

    let other_all_rooms = other_type.is_some_and(|t| t.all_rooms);
    let room_blocks = match subject.room {
        Some(room) => other.room == Some(room) || other_all_rooms,
        None if subject_type.is_some_and(|t| t.all_rooms) => true,
        None => other_all_rooms || same_owner,
    };
    if !room_blocks {
        return false;
    }

    if let (Some(user), Some(event_type)) = (subject.user, subject_type) {
        if event_type.locks_user {
            return other.user == Some(user) && other_type.is_some_and(|t| t.locks_user);
        }
    }
    true
}

fn dates_overlap(subject: &Occupancy<'_>, other: &Event) -> bool {
    let other_last = other.end_date.unwrap_or(other.start_date);
    other.start_date <= subject.last_date() && subject.start_date <= other_last
}

/// Time ranges only matter for single-day subjects with both times set. Against such a
/// subject, full-day entries always overlap and half-timed entries never do.
fn times_overlap(subject: &Occupancy<'_>, other: &Event) -> bool {
    if !subject.is_single_day() {
        return true;
    }
    let (Some(start), Some(end)) = (subject.start_time, subject.end_time) else {
        return true;
    };
    match (other.start_time, other.end_time) {
        (None, None) => true,
        (Some(other_start), Some(other_end)) => other_start < end && start < other_end,
        _ => false,
    }
}
