mod common;

use calendar_core::{
    calendar::{
        EntryState, Event, EventCandidate, EventType, Occupancy, OwnerRef, RecurrenceRule, Recurrency,
    },
    core::{reconcile, EventGenerator, ReconcileOptions, Reservation},
    errors::CalendarError,
    storage::{EventStore, InMemoryStore},
};
use common::{date, lesson_type, mon_wed_reservation, options};
use uuid::Uuid;

fn owned_dates(store: &InMemoryStore, reservation: &Reservation) -> Vec<(Option<u32>, chrono::NaiveDate)> {
    store
        .existing_owned_events(&reservation.owner_ref())
        .unwrap()
        .iter()
        .map(|event| (event.sequence_number, event.start_date))
        .collect()
}

#[test]
fn weekly_mon_wed_creates_four_lessons() {
    let reservation = mon_wed_reservation(4);
    let mut store = InMemoryStore::new();

    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 4);
    assert!(report.unresolved.is_none());
    assert_eq!(
        owned_dates(&store, &reservation),
        vec![
            (Some(1), date(2024, 1, 1)),
            (Some(2), date(2024, 1, 3)),
            (Some(3), date(2024, 1, 8)),
            (Some(4), date(2024, 1, 10)),
        ]
    );
    let summaries: Vec<&str> = report.created.iter().map(|e| e.summary.as_str()).collect();
    assert_eq!(summaries, ["Lesson 1", "Lesson 2", "Lesson 3", "Lesson 4"]);
    assert!(report.created.iter().all(|e| e.state == EntryState::Suggested));
}

#[test]
fn second_run_changes_nothing() {
    let reservation = mon_wed_reservation(4);
    let mut store = InMemoryStore::new();
    reconcile(&reservation, &mut store, &options()).unwrap();
    let before = store.snapshot();

    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 0);
    assert!(report.updated.is_empty());
    assert_eq!(store.snapshot(), before);
}

#[test]
fn resumes_after_hand_edited_occurrence() {
    let reservation = mon_wed_reservation(4);
    let owner = reservation.owner_ref();
    let mut store = InMemoryStore::new();
    store
        .create(&EventCandidate::new(owner.clone(), 1, date(2024, 1, 1)))
        .unwrap();
    let mut moved = EventCandidate::new(owner, 2, date(2024, 1, 5));
    moved.state = EntryState::Draft;
    store.create(&moved).unwrap();

    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 2);
    assert_eq!(
        owned_dates(&store, &reservation),
        vec![
            (Some(1), date(2024, 1, 1)),
            (Some(2), date(2024, 1, 5)),
            (Some(3), date(2024, 1, 8)),
            (Some(4), date(2024, 1, 10)),
        ]
    );
}

#[test]
fn later_edits_anchor_following_occurrences() {
    let reservation = mon_wed_reservation(5);
    let mut store = InMemoryStore::new();
    reconcile(&reservation, &mut store, &options()).unwrap();

    // Occurrence 4 was pushed from Wed 01-10 to Thu 01-11 and confirmed.
    let mut fourth = store
        .existing_owned_events(&reservation.owner_ref())
        .unwrap()
        .into_iter()
        .find(|e| e.sequence_number == Some(4))
        .unwrap();
    fourth.start_date = date(2024, 1, 11);
    fourth.set_state(EntryState::Confirmed);
    store.update(&fourth).unwrap();

    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 0);
    assert_eq!(
        owned_dates(&store, &reservation),
        vec![
            (Some(1), date(2024, 1, 1)),
            (Some(2), date(2024, 1, 3)),
            (Some(3), date(2024, 1, 8)),
            (Some(4), date(2024, 1, 11)),
            (Some(5), date(2024, 1, 15)),
        ]
    );
}

#[test]
fn user_modified_events_survive_shrinking_horizon() {
    let mut reservation = mon_wed_reservation(6);
    let mut store = InMemoryStore::new();
    let created = reconcile(&reservation, &mut store, &options()).unwrap().created;
    assert_eq!(created.len(), 6);

    let mut third = created[2].clone();
    third.start_date = date(2024, 1, 9);
    third.set_state(EntryState::Draft);
    store.update(&third).unwrap();
    let fifth = created[4].clone().with_state(EntryState::Confirmed);
    store.update(&fifth).unwrap();

    reservation.max_date = Some(date(2024, 1, 2));
    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    let mut deleted = report.deleted.clone();
    deleted.sort();
    let mut expected = vec![created[3].id, created[5].id];
    expected.sort();
    assert_eq!(deleted, expected);
    assert_eq!(store.get(third.id).unwrap().start_date, date(2024, 1, 9));
    assert_eq!(store.get(fifth.id).unwrap().state, EntryState::Confirmed);
    assert!(store.get(created[0].id).is_some());
}

#[test]
fn rule_changes_rewrite_untouched_events_in_place() {
    let mut reservation = mon_wed_reservation(2);
    let mut store = InMemoryStore::new();
    let created = reconcile(&reservation, &mut store, &options()).unwrap().created;

    let room = Uuid::new_v4();
    reservation.room = Some(room);
    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 0);
    assert_eq!(report.updated.len(), 2);
    for event in &created {
        assert_eq!(store.get(event.id).unwrap().room, Some(room));
    }
}

#[test]
fn shorter_rule_deletes_surplus_occurrences() {
    let mut reservation = mon_wed_reservation(4);
    let mut store = InMemoryStore::new();
    reconcile(&reservation, &mut store, &options()).unwrap();

    reservation.rule.max_occurrences = Some(2);
    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.deleted.len(), 2);
    assert_eq!(report.touched(), 2);
    assert_eq!(store.len(), 2);
}

/// Delegates to an in-memory store but refuses every in-place update.
struct FailingUpdates {
    inner: InMemoryStore,
    updates: usize,
}

impl EventStore for FailingUpdates {
    fn event(&self, id: Uuid) -> Result<Option<Event>, CalendarError> {
        self.inner.event(id)
    }

    fn event_type(&self, id: Uuid) -> Result<Option<EventType>, CalendarError> {
        self.inner.event_type(id)
    }

    fn all_events(&self) -> Result<Vec<Event>, CalendarError> {
        self.inner.all_events()
    }

    fn existing_owned_events(&self, owner: &OwnerRef) -> Result<Vec<Event>, CalendarError> {
        self.inner.existing_owned_events(owner)
    }

    fn has_conflict(&self, subject: &Occupancy<'_>) -> Result<bool, CalendarError> {
        self.inner.has_conflict(subject)
    }

    fn conflicting_events(&self, subject: &Occupancy<'_>) -> Result<Vec<Event>, CalendarError> {
        self.inner.conflicting_events(subject)
    }

    fn create(&mut self, candidate: &EventCandidate) -> Result<Event, CalendarError> {
        self.inner.create(candidate)
    }

    fn update(&mut self, _event: &Event) -> Result<(), CalendarError> {
        self.updates += 1;
        Err(CalendarError::Storage("disk full".into()))
    }

    fn delete(&mut self, id: Uuid) -> Result<(), CalendarError> {
        self.inner.delete(id)
    }
}

#[test]
fn failed_update_aborts_before_deleting_or_creating() {
    let mut reservation = mon_wed_reservation(4);
    let mut inner = InMemoryStore::new();
    reconcile(&reservation, &mut inner, &options()).unwrap();
    let before = inner.snapshot();
    let mut store = FailingUpdates { inner, updates: 0 };

    reservation.room = Some(Uuid::new_v4());
    reservation.rule.max_occurrences = Some(2);
    let result = reconcile(&reservation, &mut store, &options());

    assert!(matches!(result, Err(CalendarError::Storage(_))));
    assert_eq!(store.updates, 1);
    assert_eq!(store.inner.len(), 4);
    assert_eq!(store.inner.snapshot(), before);
}

#[test]
fn once_rule_is_normalised_and_generates_single_event() {
    let mut rule = RecurrenceRule::new(Recurrency::Once)
        .every(3)
        .limited_to(5)
        .starting(date(2024, 2, 14));
    rule.validate().unwrap();
    let normalised = rule.clone();
    rule.validate().unwrap();
    assert_eq!(rule, normalised);
    assert_eq!((rule.max_occurrences, rule.interval), (Some(1), 0));

    let reservation = Reservation::new(rule, lesson_type());
    let mut store = InMemoryStore::new();
    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 1);
    assert_eq!(report.created[0].start_date, date(2024, 2, 14));
}

#[test]
fn dates_before_floor_keep_numbering_but_are_skipped() {
    let reservation = mon_wed_reservation(4);
    let mut store = InMemoryStore::new();
    let options = options().ignoring_before(date(2024, 1, 8));

    reconcile(&reservation, &mut store, &options).unwrap();

    assert_eq!(
        owned_dates(&store, &reservation),
        vec![(Some(3), date(2024, 1, 8)), (Some(4), date(2024, 1, 10))]
    );
}

#[test]
fn site_default_caps_open_ended_rules() {
    let mut reservation = mon_wed_reservation(0);
    reservation.rule.max_occurrences = None;
    let mut store = InMemoryStore::new();

    let report = reconcile(&reservation, &mut store, &options().with_max_auto_events(3)).unwrap();

    assert_eq!(report.touched(), 3);
}

#[test]
fn horizon_stops_open_ended_rules() {
    let mut reservation = mon_wed_reservation(0);
    reservation.rule.max_occurrences = None;
    let mut store = InMemoryStore::new();
    let options = ReconcileOptions::new(date(2024, 1, 1), date(2024, 1, 31));

    let report = reconcile(&reservation, &mut store, &options).unwrap();

    // Mondays and Wednesdays of January 2024.
    assert_eq!(report.touched(), 10);
    assert!(report.created.iter().all(|e| e.start_date <= date(2024, 1, 31)));
}

#[test]
fn missing_event_type_generates_nothing() {
    let mut reservation = mon_wed_reservation(4);
    reservation.event_type = None;
    let mut store = InMemoryStore::new();

    let report = reconcile(&reservation, &mut store, &options()).unwrap();

    assert_eq!(report.touched(), 0);
    assert!(store.is_empty());
}

#[test]
fn missing_horizon_is_fatal() {
    let reservation = mon_wed_reservation(4);
    let mut store = InMemoryStore::new();
    let options = ReconcileOptions {
        horizon: None,
        ..options()
    };

    let result = reconcile(&reservation, &mut store, &options);

    assert!(matches!(result, Err(CalendarError::MissingHorizon)));
}

#[test]
fn manual_entries_are_left_alone() {
    let reservation = mon_wed_reservation(2);
    let mut store = InMemoryStore::new();
    let manual = store.insert(Event::new("Dentist", date(2024, 1, 1)));

    reconcile(&reservation, &mut store, &options()).unwrap();
    let mut shorter = reservation.clone();
    shorter.rule.max_occurrences = Some(1);
    reconcile(&shorter, &mut store, &options()).unwrap();

    assert!(store.get(manual).is_some());
    assert_eq!(store.len(), 2);
}
