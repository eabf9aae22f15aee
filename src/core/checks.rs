//! Consistency checks over stored entries.

use std::fmt;

use tracing::{debug, info};
use uuid::Uuid;

use super::generator::EventGenerator;
use crate::{
    calendar::{Event, Occupancy},
    errors::{CalendarError, CalendarResult},
    storage::EventStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemKind {
    Conflict { count: usize },
    /// A generated entry whose type differs from what its generator produces today.
    ObsoleteEventType { expected: Option<Uuid> },
    TooLong { days: i64, max_days: u32 },
    UnknownOwner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataProblem {
    pub event: Uuid,
    pub kind: ProblemKind,
    pub message: String,
}

impl DataProblem {
    pub fn is_fixable(&self) -> bool {
        matches!(
            self.kind,
            ProblemKind::ObsoleteEventType { .. } | ProblemKind::TooLong { .. }
        )
    }
}

impl fmt::Display for DataProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_fixable() { "(*) " } else { "" };
        write!(f, "{}{}", marker, self.message)
    }
}

/// Runs every check on every stored entry. `generators` are the known owners.
pub fn check_events<S>(
    store: &S,
    generators: &[&dyn EventGenerator],
) -> CalendarResult<Vec<DataProblem>>
where
    S: EventStore + ?Sized,
{
    let mut problems = Vec::new();
    for event in store.all_events()? {
        check_conflicts(store, &event, &mut problems)?;
        check_owner(&event, generators, &mut problems);
        check_duration(store, &event, &mut problems)?;
    }
    info!(problems = problems.len(), "checked calendar entries");
    Ok(problems)
}

/// Repairs a fixable problem. Returns false when there was nothing to do.
pub fn fix_problem<S>(store: &mut S, problem: &DataProblem) -> CalendarResult<bool>
where
    S: EventStore + ?Sized,
{
    let mut event = store
        .event(problem.event)?
        .ok_or(CalendarError::EventNotFound(problem.event))?;
    match problem.kind {
        ProblemKind::ObsoleteEventType { expected } => event.event_type = expected,
        ProblemKind::TooLong { .. } => event.end_date = None,
        ProblemKind::Conflict { .. } | ProblemKind::UnknownOwner => return Ok(false),
    }
    store.update(&event)?;
    debug!(event = %event, "fixed data problem");
    Ok(true)
}

fn check_conflicts<S>(store: &S, event: &Event, problems: &mut Vec<DataProblem>) -> CalendarResult<()>
where
    S: EventStore + ?Sized,
{
    let subject = Occupancy::from(event);
    if !store.has_conflict(&subject)? {
        return Ok(());
    }
    let conflicts = store.conflicting_events(&subject)?;
    let message = match conflicts.as_slice() {
        [single] => format!("Event conflicts with {}.", single),
        many => format!("Event conflicts with {} other events.", many.len()),
    };
    problems.push(DataProblem {
        event: event.id,
        kind: ProblemKind::Conflict {
            count: conflicts.len(),
        },
        message,
    });
    Ok(())
}

fn check_owner(event: &Event, generators: &[&dyn EventGenerator], problems: &mut Vec<DataProblem>) {
    if event.sequence_number.is_none() {
        return;
    }
    let generator = event.owner.as_ref().and_then(|owner| {
        generators
            .iter()
            .find(|generator| generator.owner_ref() == *owner)
    });
    let Some(generator) = generator else {
        problems.push(DataProblem {
            event: event.id,
            kind: ProblemKind::UnknownOwner,
            message: "Has sequence number but no known owner.".to_string(),
        });
        return;
    };
    let expected = generator.event_type().map(|event_type| event_type.id);
    if event.event_type != expected {
        problems.push(DataProblem {
            event: event.id,
            kind: ProblemKind::ObsoleteEventType { expected },
            message: format!(
                "Event type {} (should be {}).",
                describe_type(event.event_type),
                describe_type(expected)
            ),
        });
    }
}

fn check_duration<S>(store: &S, event: &Event, problems: &mut Vec<DataProblem>) -> CalendarResult<()>
where
    S: EventStore + ?Sized,
{
    let (Some(end_date), Some(type_id)) = (event.end_date, event.event_type) else {
        return Ok(());
    };
    let Some(event_type) = store.event_type(type_id)? else {
        return Ok(());
    };
    let days = (end_date - event.start_date).num_days();
    if days > i64::from(event_type.max_days) {
        problems.push(DataProblem {
            event: event.id,
            kind: ProblemKind::TooLong {
                days,
                max_days: event_type.max_days,
            },
            message: format!(
                "Event lasts {} days but only {} are allowed.",
                days, event_type.max_days
            ),
        });
    }
    Ok(())
}

fn describe_type(id: Option<Uuid>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
