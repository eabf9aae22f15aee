//! Reconciliation of a generator's wanted occurrences with the entries already stored.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::generator::{EventGenerator, ReconcileOptions};
use crate::{
    calendar::{EntryState, Event, EventCandidate, EventType, Occupancy, OwnerRef, RecurrenceRule},
    errors::{CalendarError, CalendarResult},
    storage::EventStore,
};

/// What a reconcile run changed in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<Event>,
    pub deleted: Vec<Uuid>,
    /// Entries rewritten in place while generating. Not part of [`touched`](Self::touched).
    pub updated: Vec<Uuid>,
    /// Set when generation stopped because a candidate found no free slot.
    pub unresolved: Option<UnresolvedConflict>,
}

impl ReconcileReport {
    /// Number of occurrences created or removed.
    pub fn touched(&self) -> usize {
        self.created.len() + self.deleted.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedConflict {
    pub candidate: EventCandidate,
    pub conflicts: Vec<Event>,
}

/// Outcome of [`resolve_conflicts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(NaiveDate),
    Unresolved { conflicts: Vec<Event> },
}

/// Outcome of [`move_to_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { event: Event, report: ReconcileReport },
    /// No free date before the horizon; nothing was saved.
    Unavailable { conflicts: Vec<Event> },
}

/// Brings the stored occurrences of `generator` in line with its recurrence rule.
///
/// Entries edited by hand are never rewritten nor deleted: generation resumes after the
/// first of them, and later ones anchor the following occurrences to their own date.
pub fn reconcile<G, S>(
    generator: &G,
    store: &mut S,
    options: &ReconcileOptions,
) -> CalendarResult<ReconcileReport>
where
    G: EventGenerator + ?Sized,
    S: EventStore + ?Sized,
{
    let owner = generator.owner_ref();
    let mut report = ReconcileReport::default();
    let Some(rule) = generator.recurrence_rule() else {
        info!(%owner, "no recurrence rule");
        return Ok(report);
    };
    if rule.frequency.is_none() {
        info!(%owner, "recurrence rule has no unit");
        return Ok(report);
    }

    let existing = store.existing_owned_events(&owner)?;
    let (mut sequence, start) = match existing.iter().find(|event| event.is_user_modified()) {
        Some(anchor) => {
            let sequence = anchor.sequence_number.unwrap_or_default();
            debug!(%owner, sequence, date = %anchor.start_date, "resuming after edited entry");
            (sequence, rule.next_suggested_date(anchor.start_date))
        }
        None => (0, generator.from_date(options)),
    };
    let mut unwanted: BTreeMap<u32, Event> = existing
        .into_iter()
        .filter_map(|event| match event.sequence_number {
            Some(number) if number > sequence => Some((number, event)),
            _ => None,
        })
        .collect();

    let Some(event_type) = generator.event_type() else {
        warn!(%owner, "no automatic events because event type is empty");
        return Ok(report);
    };
    let Some(mut date) = start.and_then(|date| rule.first_available_date(date)) else {
        info!(%owner, "no available start date");
        return Ok(report);
    };
    let until = generator
        .until_date()
        .or(options.horizon)
        .ok_or(CalendarError::MissingHorizon)?;
    let max_events = rule
        .max_occurrences
        .or_else(|| generator.max_events_default())
        .or(options.max_auto_events);
    info!(%owner, from = %date, %until, max = ?max_events, "generating events");

    let user = generator.responsible_user();
    let mut wanted: BTreeMap<u32, EventCandidate> = BTreeMap::new();
    while max_events.map_or(true, |max| sequence < max) {
        if date > until {
            info!(%owner, %until, "reached upper date limit");
            break;
        }
        sequence += 1;
        if options.ignore_dates_before.map_or(true, |floor| date >= floor) {
            let mut candidate = EventCandidate::new(owner.clone(), sequence, date);
            candidate.summary = generator.summary_for(event_type, sequence);
            candidate.user = user;
            candidate.room = generator.room_for(sequence);
            candidate.event_type = Some(event_type.id);
            candidate.start_time = rule.start_time;
            candidate.end_time = rule.end_time;
            place(rule, Some(event_type), &mut candidate, date);

            match resolve_conflicts(generator, &*store, rule, Some(event_type), &mut candidate, until)? {
                Resolution::Resolved(resolved) => date = resolved,
                Resolution::Unresolved { conflicts } => {
                    report.unresolved = Some(UnresolvedConflict { candidate, conflicts });
                    break;
                }
            }

            match unwanted.remove(&sequence) {
                None => {
                    wanted.insert(sequence, candidate);
                }
                Some(edited) if edited.is_user_modified() => {
                    debug!(
                        "{} has been moved from {} to {}",
                        edited.summary, date, edited.start_date
                    );
                    date = edited.start_date;
                }
                Some(mut stale) => {
                    generator.before_auto_event_save(&mut candidate);
                    if stale.apply_candidate(&candidate) {
                        store.update(&stale)?;
                        report.updated.push(stale.id);
                    }
                }
            }
        }
        match rule.next_suggested_date(date) {
            Some(next) => date = next,
            None => {
                info!(%owner, "could not find next date");
                break;
            }
        }
    }

    for event in unwanted.into_values() {
        if event.is_user_modified() {
            continue;
        }
        store.delete(event.id)?;
        report.deleted.push(event.id);
    }
    for mut candidate in wanted.into_values() {
        generator.before_auto_event_save(&mut candidate);
        report.created.push(store.create(&candidate)?);
    }
    info!(
        %owner,
        created = report.created.len(),
        deleted = report.deleted.len(),
        updated = report.updated.len(),
        "reconciled generated events"
    );
    Ok(report)
}

/// Pushes `candidate` forward until it no longer conflicts, without passing `until`.
pub fn resolve_conflicts<G, S>(
    generator: &G,
    store: &S,
    rule: &RecurrenceRule,
    event_type: Option<&EventType>,
    candidate: &mut EventCandidate,
    until: NaiveDate,
) -> CalendarResult<Resolution>
where
    G: EventGenerator + ?Sized,
    S: EventStore + ?Sized,
{
    if rule.is_once() || !generator.cares_about_conflicts(candidate) {
        return Ok(Resolution::Resolved(candidate.start_date));
    }
    while store.has_conflict(&Occupancy::from(&*candidate))? {
        match rule.next_alternate_date(candidate.start_date) {
            Some(date) if date <= until => {
                debug!("{} conflicts on {}, moving to {}", candidate, candidate.start_date, date);
                place(rule, event_type, candidate, date);
            }
            next => {
                let conflicts = store.conflicting_events(&Occupancy::from(&*candidate))?;
                let names: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
                warn!(
                    next = ?next,
                    %until,
                    "{} conflicts with {}",
                    candidate,
                    names.join(", ")
                );
                return Ok(Resolution::Unresolved { conflicts });
            }
        }
    }
    Ok(Resolution::Resolved(candidate.start_date))
}

/// Moves one generated entry to the next available date and shifts the occurrences
/// that follow it.
pub fn move_to_next<G, S>(
    generator: &G,
    store: &mut S,
    event: &Event,
    options: &ReconcileOptions,
) -> CalendarResult<MoveOutcome>
where
    G: EventGenerator + ?Sized,
    S: EventStore + ?Sized,
{
    let owner = generator.owner_ref();
    if event.sequence_number.is_none() {
        return Err(CalendarError::UncontrolledEvent(event.id));
    }
    if !event.is_owned_by(&owner) {
        return Err(CalendarError::ForeignEvent {
            event: event.id,
            generator: owner,
            owner: event
                .owner
                .as_ref()
                .map_or_else(|| "nobody".to_string(), OwnerRef::to_string),
        });
    }
    if event.is_fixed_state() {
        return Err(CalendarError::FixedState(event.id));
    }
    let rule = generator
        .recurrence_rule()
        .ok_or_else(|| CalendarError::MissingRule(owner.clone()))?;

    let mut moved = event.clone();
    if moved.state == EntryState::Suggested {
        moved.set_state(EntryState::Draft);
    }
    let Some(date) = rule.next_alternate_date(moved.start_date) else {
        info!(%owner, "no alternate date after {}", moved.start_date);
        return Ok(MoveOutcome::Unavailable { conflicts: Vec::new() });
    };
    let until = generator
        .until_date()
        .or(options.horizon)
        .ok_or(CalendarError::MissingHorizon)?;
    let mut candidate = moved
        .to_candidate()
        .ok_or(CalendarError::UncontrolledEvent(event.id))?;
    place(rule, generator.event_type(), &mut candidate, date);
    match resolve_conflicts(generator, &*store, rule, generator.event_type(), &mut candidate, until)? {
        Resolution::Resolved(_) => {}
        Resolution::Unresolved { conflicts } => {
            return Ok(MoveOutcome::Unavailable { conflicts });
        }
    }

    moved.apply_candidate(&candidate);
    store.update(&moved)?;
    info!(%owner, event = %moved, "moved entry to next available date");
    let report = reconcile(generator, store, options)?;
    Ok(MoveOutcome::Moved { event: moved, report })
}

/// Deletes every entry generated by `generator`, edited or not. Returns how many went.
pub fn purge_auto_events<G, S>(generator: &G, store: &mut S) -> CalendarResult<usize>
where
    G: EventGenerator + ?Sized,
    S: EventStore + ?Sized,
{
    let owner = generator.owner_ref();
    let owned = store.existing_owned_events(&owner)?;
    for event in &owned {
        store.delete(event.id)?;
    }
    info!(%owner, deleted = owned.len(), "purged generated events");
    Ok(owned.len())
}

/// Relocates `candidate` to `date`; types limited to one day never carry an end date.
fn place(
    rule: &RecurrenceRule,
    event_type: Option<&EventType>,
    candidate: &mut EventCandidate,
    date: NaiveDate,
) {
    rule.relocate(candidate, date);
    if event_type.map_or(false, |event_type| event_type.max_days <= 1) {
        candidate.end_date = None;
    }
}
