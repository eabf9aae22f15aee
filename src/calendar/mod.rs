//! Calendar domain models: recurrence rules, entries, entry types and the
//! conflict rules that decide whether two entries compete for a slot.

pub mod conflict;
pub mod event;
pub mod event_type;
pub mod recurrence;
pub mod recurrency;
pub mod weekday;

pub use conflict::{conflicting_events, has_conflict, EventTypes, Occupancy};
pub use event::{EntryState, Event, EventCandidate, OwnerRef};
pub use event_type::EventType;
pub use recurrence::RecurrenceRule;
pub use recurrency::{easter_sunday, Recurrency};
pub use weekday::WeekdayMask;
