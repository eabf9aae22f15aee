//! Ready-made generators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::generator::{EventGenerator, ReconcileOptions};
use crate::calendar::{EventCandidate, EventType, OwnerRef, RecurrenceRule, Recurrency};

/// A room booked along a recurrence rule, e.g. a weekly course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub rule: RecurrenceRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Uuid>,
    /// Last date to book for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
}

impl Reservation {
    pub const KIND: &'static str = "reservation";

    pub fn new(rule: RecurrenceRule, event_type: EventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule,
            room: None,
            max_date: None,
            event_type: Some(event_type),
            user: None,
        }
    }

    pub fn in_room(mut self, room: Uuid) -> Self {
        self.room = Some(room);
        self
    }

    pub fn until(mut self, max_date: NaiveDate) -> Self {
        self.max_date = Some(max_date);
        self
    }

    pub fn for_user(mut self, user: Uuid) -> Self {
        self.user = Some(user);
        self
    }
}

impl EventGenerator for Reservation {
    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(Self::KIND, self.id)
    }

    fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        Some(&self.rule)
    }

    fn event_type(&self) -> Option<&EventType> {
        self.event_type.as_ref()
    }

    fn from_date(&self, options: &ReconcileOptions) -> Option<NaiveDate> {
        Some(self.rule.start_date.unwrap_or(options.today))
    }

    fn until_date(&self) -> Option<NaiveDate> {
        self.max_date
    }

    fn room_for(&self, _sequence_number: u32) -> Option<Uuid> {
        self.room
    }

    fn responsible_user(&self) -> Option<Uuid> {
        self.user
    }
}

/// A named entry repeating on its own, typically a yearly holiday.
///
/// Holidays are placed regardless of what else is booked on their dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrentEvent {
    pub id: Uuid,
    pub name: String,
    pub rule: RecurrenceRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
}

impl RecurrentEvent {
    pub const KIND: &'static str = "recurrent_event";

    /// A yearly entry starting on `start_date`.
    pub fn yearly(name: impl Into<String>, start_date: NaiveDate, event_type: EventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rule: RecurrenceRule::new(Recurrency::Yearly).starting(start_date),
            event_type: Some(event_type),
            user: None,
        }
    }

    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rule = rule;
        self
    }
}

impl EventGenerator for RecurrentEvent {
    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(Self::KIND, self.id)
    }

    fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        Some(&self.rule)
    }

    fn event_type(&self) -> Option<&EventType> {
        self.event_type.as_ref()
    }

    fn from_date(&self, _options: &ReconcileOptions) -> Option<NaiveDate> {
        self.rule.start_date
    }

    fn summary_for(&self, _event_type: &EventType, _sequence_number: u32) -> String {
        self.name.clone()
    }

    fn responsible_user(&self) -> Option<Uuid> {
        self.user
    }

    fn cares_about_conflicts(&self, _candidate: &EventCandidate) -> bool {
        false
    }
}
