use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar::{EventCandidate, EventType, OwnerRef, RecurrenceRule};

/// Run-wide settings for a reconcile call, usually produced by
/// [`SchedulerConfig::options`](crate::config::SchedulerConfig::options).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub today: NaiveDate,
    /// Occurrences dated before this floor keep their sequence number but are not generated.
    pub ignore_dates_before: Option<NaiveDate>,
    /// Global horizon used when the generator has no `until_date` of its own.
    pub horizon: Option<NaiveDate>,
    /// Site default cap applied when neither the rule nor the generator sets one.
    pub max_auto_events: Option<u32>,
}

impl ReconcileOptions {
    pub fn new(today: NaiveDate, horizon: NaiveDate) -> Self {
        Self {
            today,
            ignore_dates_before: None,
            horizon: Some(horizon),
            max_auto_events: None,
        }
    }

    pub fn ignoring_before(mut self, floor: NaiveDate) -> Self {
        self.ignore_dates_before = Some(floor);
        self
    }

    pub fn with_max_auto_events(mut self, cap: u32) -> Self {
        self.max_auto_events = Some(cap);
        self
    }
}

/// A domain object that owns a sequence of generated calendar entries.
///
/// Only `owner_ref`, `recurrence_rule` and `event_type` are required; the other hooks
/// fall back to the behaviour of a plain generator.
pub trait EventGenerator {
    /// Identity stamped on every generated entry.
    fn owner_ref(&self) -> OwnerRef;

    fn recurrence_rule(&self) -> Option<&RecurrenceRule>;

    /// Type of the generated entries. `None` disables generation.
    fn event_type(&self) -> Option<&EventType>;

    /// Date of the first occurrence when no entry has been edited by hand.
    fn from_date(&self, options: &ReconcileOptions) -> Option<NaiveDate> {
        Some(options.today)
    }

    /// Last date to generate for; `None` defers to the global horizon.
    fn until_date(&self) -> Option<NaiveDate> {
        None
    }

    fn room_for(&self, _sequence_number: u32) -> Option<Uuid> {
        None
    }

    fn summary_for(&self, event_type: &EventType, sequence_number: u32) -> String {
        format!("{} {}", event_type.label(), sequence_number)
    }

    fn responsible_user(&self) -> Option<Uuid> {
        None
    }

    fn cares_about_conflicts(&self, _candidate: &EventCandidate) -> bool {
        true
    }

    /// Generator-specific cap, consulted before the site default.
    fn max_events_default(&self) -> Option<u32> {
        None
    }

    /// Last chance to adjust a candidate before it is written to the store.
    fn before_auto_event_save(&self, _candidate: &mut EventCandidate) {}
}
