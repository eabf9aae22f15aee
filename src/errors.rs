use thiserror::Error;
use uuid::Uuid;

use crate::calendar::OwnerRef;

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Error type that captures scheduling, configuration and storage failures.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No horizon configured: set `ignore_dates_after` or a positive `horizon_years`")]
    MissingHorizon,
    #[error("Generator {0} has no recurrence rule")]
    MissingRule(OwnerRef),
    #[error("Cannot move uncontrolled event {0}")]
    UncontrolledEvent(Uuid),
    #[error("{generator} cannot move event {event} controlled by {owner}")]
    ForeignEvent {
        event: Uuid,
        generator: OwnerRef,
        owner: String,
    },
    #[error("Event {0} is in a fixed state and cannot be moved")]
    FixedState(Uuid),
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Generator lock poisoned for {0}")]
    LockPoisoned(OwnerRef),
}
