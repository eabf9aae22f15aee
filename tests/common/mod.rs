#![allow(dead_code)]

use std::sync::Mutex;

use calendar_core::{
    calendar::{EventType, RecurrenceRule, Recurrency, WeekdayMask},
    core::{ReconcileOptions, Reservation},
    storage::JsonStore,
};
use chrono::{NaiveDate, Weekday};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn lesson_type() -> EventType {
    EventType::new("Lesson")
}

pub fn holiday_type() -> EventType {
    EventType::new("Holiday").locking_all_rooms()
}

/// Weekly on Monday and Wednesday from Monday 2024-01-01.
pub fn mon_wed_rule(max_occurrences: u32) -> RecurrenceRule {
    RecurrenceRule::new(Recurrency::Weekly)
        .on(WeekdayMask::from_days(&[Weekday::Mon, Weekday::Wed]))
        .starting(date(2024, 1, 1))
        .limited_to(max_occurrences)
}

pub fn mon_wed_reservation(max_occurrences: u32) -> Reservation {
    Reservation::new(mon_wed_rule(max_occurrences), lesson_type())
}

/// Options as seen on 2024-01-01 with the horizon at the end of 2024.
pub fn options() -> ReconcileOptions {
    ReconcileOptions::new(date(2024, 1, 1), date(2024, 12, 31)).with_max_auto_events(72)
}

/// JSON store in a unique directory that outlives the test.
pub fn temp_json_store() -> JsonStore {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("events.json");
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    JsonStore::open(path).expect("open json store")
}
