#![doc(test(attr(deny(warnings))))]

//! Calendar Core generates the occurrences of recurring calendar entries and keeps
//! them in line with what is already booked: hand-edited entries are respected and
//! conflicting slots are skipped.

pub mod calendar;
pub mod config;
pub mod core;
pub mod errors;
pub mod storage;
pub mod utils;

pub use errors::{CalendarError, CalendarResult};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Calendar Core tracing initialized.");
    });
}
