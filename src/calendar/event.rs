use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Back-reference from a generated entry to the generator instance that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub id: Uuid,
}

impl OwnerRef {
    pub fn new(kind: impl Into<String>, id: Uuid) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Proposed by a generator and untouched by a human.
    #[default]
    Suggested,
    Draft,
    Confirmed,
    TookPlace,
    Cancelled,
    Omitted,
}

impl EntryState {
    /// Fixed entries are never repositioned automatically.
    pub fn is_fixed(&self) -> bool {
        matches!(
            self,
            EntryState::Confirmed
                | EntryState::TookPlace
                | EntryState::Cancelled
                | EntryState::Omitted
        )
    }

    /// Transparent entries do not block scheduling of other entries.
    pub fn is_transparent(&self) -> bool {
        matches!(self, EntryState::Cancelled | EntryState::Omitted)
    }

    /// Entering a `noauto` state detaches the entry from its generator.
    pub fn is_noauto(&self) -> bool {
        matches!(self, EntryState::Cancelled)
    }
}

/// A calendar entry as persisted by an event store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerRef>,
    /// Position within the owner's recurrence. `None` for manually created entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
    #[serde(default)]
    pub state: EntryState,
    #[serde(default)]
    pub summary: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
    #[serde(default)]
    pub transparent: bool,
}

impl Event {
    /// A manual (ownerless) entry in the `draft` state.
    pub fn new(summary: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: None,
            sequence_number: None,
            state: EntryState::Draft,
            summary: summary.into(),
            start_date,
            end_date: None,
            start_time: None,
            end_time: None,
            event_type: None,
            room: None,
            user: None,
            transparent: false,
        }
    }

    /// Materializes a generated candidate under a fresh identity.
    pub fn from_candidate(candidate: &EventCandidate) -> Self {
        Self {
            id: candidate.event_id.unwrap_or_else(Uuid::new_v4),
            owner: Some(candidate.owner.clone()),
            sequence_number: Some(candidate.sequence_number),
            state: candidate.state,
            summary: candidate.summary.clone(),
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

    pub fn with_times(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_room(mut self, room: Uuid) -> Self {
        self.room = Some(room);
        self
    }

    pub fn with_type(mut self, event_type: Uuid) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_user(mut self, user: Uuid) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_state(mut self, state: EntryState) -> Self {
        self.set_state(state);
        self
    }

    /// True once a human has touched the entry, i.e. it left the `suggested` state.
    pub fn is_user_modified(&self) -> bool {
        self.state != EntryState::Suggested
    }

    pub fn is_fixed_state(&self) -> bool {
        self.state.is_fixed()
    }

    pub fn is_owned_by(&self, owner: &OwnerRef) -> bool {
        self.owner.as_ref() == Some(owner)
    }

    /// Changes the workflow state; `noauto` states release the entry from its generator.
    pub fn set_state(&mut self, state: EntryState) {
        if state.is_noauto() {
            self.sequence_number = None;
        }
        self.state = state;
    }

    /// Copies the generator-managed fields from `candidate`. Returns whether anything changed.
    pub fn apply_candidate(&mut self, candidate: &EventCandidate) -> bool {
        let before = self.clone();
        self.summary.clone_from(&candidate.summary);
        self.user = candidate.user;
        self.start_date = candidate.start_date;
        self.end_date = candidate.end_date;
        self.start_time = candidate.start_time;
        self.end_time = candidate.end_time;
        self.event_type = candidate.event_type;
        self.room = candidate.room;
        *self != before
    }

    /// Candidate view of a generated entry, used when repositioning it.
    pub fn to_candidate(&self) -> Option<EventCandidate> {
        Some(EventCandidate {
            event_id: Some(self.id),
            sequence_number: self.sequence_number?,
            owner: self.owner.clone()?,
            state: self.state,
            summary: self.summary.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            event_type: self.event_type,
            room: self.room,
            user: self.user,
            transparent: self.transparent,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.summary.is_empty() {
            "Calendar entry"
        } else {
            self.summary.as_str()
        };
        write!(f, "{} ({}", label, self.start_date)?;
        if let Some(time) = self.start_time {
            write!(f, " {}", time.format("%H:%M"))?;
        }
        write!(f, ")")
    }
}

/// In-memory occurrence proposed by a generator during one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCandidate {
    /// Identity of the persisted entry this candidate stands for, if any.
    pub event_id: Option<Uuid>,
    /// 1-based position in the recurrence.
    pub sequence_number: u32,
    pub owner: OwnerRef,
    pub state: EntryState,
    pub summary: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: Option<Uuid>,
    pub room: Option<Uuid>,
    pub user: Option<Uuid>,
    pub transparent: bool,
}

impl EventCandidate {
    pub fn new(owner: OwnerRef, sequence_number: u32, start_date: NaiveDate) -> Self {
        Self {
            event_id: None,
            sequence_number,
            owner,
            state: EntryState::Suggested,
            summary: String::new(),
            start_date,
            end_date: None,
            start_time: None,
            end_time: None,
            event_type: None,
            room: None,
            user: None,
            transparent: false,
        }
    }
}

impl fmt::Display for EventCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} ({})",
            self.summary, self.sequence_number, self.start_date
        )
    }
}
