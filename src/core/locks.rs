use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use once_cell::sync::Lazy;
use tracing::trace;

use crate::{
    calendar::OwnerRef,
    errors::{CalendarError, CalendarResult},
};

static GLOBAL_LOCKS: Lazy<GeneratorLocks> = Lazy::new(GeneratorLocks::new);

/// Per-owner mutexes serialising reconcile runs of the same generator.
///
/// Runs for different owners touch disjoint sequence-number spaces and may proceed
/// in parallel. An owner's entry is dropped once no run holds or waits for it, so the
/// registry only tracks owners with runs in flight.
#[derive(Debug, Default)]
pub struct GeneratorLocks {
    owners: Mutex<HashMap<OwnerRef, Arc<Mutex<()>>>>,
}

impl GeneratorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static GeneratorLocks {
        &GLOBAL_LOCKS
    }

    /// Runs `f` while holding the lock of `owner`.
    pub fn with_owner<T, F>(&self, owner: &OwnerRef, f: F) -> CalendarResult<T>
    where
        F: FnOnce() -> CalendarResult<T>,
    {
        let lock = self.lock_for(owner)?;
        let result = {
            let _guard = lock
                .lock()
                .map_err(|_| CalendarError::LockPoisoned(owner.clone()))?;
            trace!(%owner, "generator lock acquired");
            f()
        };
        drop(lock);
        self.release(owner);
        result
    }

    /// Number of owners with a run in flight.
    pub fn len(&self) -> usize {
        self.owners.lock().map(|owners| owners.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets `owner` when nobody else holds a handle to its mutex. Handles are only
    /// cloned under the registry lock, so the count cannot grow while it is checked.
    fn release(&self, owner: &OwnerRef) {
        let Ok(mut owners) = self.owners.lock() else {
            return;
        };
        if owners
            .get(owner)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            owners.remove(owner);
        }
    }

    fn lock_for(&self, owner: &OwnerRef) -> CalendarResult<Arc<Mutex<()>>> {
        let mut owners = self
            .owners
            .lock()
            .map_err(|_| CalendarError::LockPoisoned(owner.clone()))?;
        Ok(owners.entry(owner.clone()).or_default().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };
    use uuid::Uuid;

    #[test]
    fn same_owner_runs_are_serialised() {
        let locks = Arc::new(GeneratorLocks::new());
        let owner = OwnerRef::new("reservation", Uuid::new_v4());
        let active = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let (locks, owner) = (Arc::clone(&locks), owner.clone());
                let (active, overlaps) = (Arc::clone(&active), Arc::clone(&overlaps));
                thread::spawn(move || {
                    locks
                        .with_owner(&owner, || {
                            if active.fetch_add(1, Ordering::SeqCst) > 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            thread::sleep(Duration::from_millis(5));
                            active.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(locks.is_empty());
    }

    #[test]
    fn finished_owners_are_forgotten() {
        let locks = GeneratorLocks::new();
        let first = OwnerRef::new("reservation", Uuid::new_v4());
        let second = OwnerRef::new("reservation", Uuid::new_v4());
        let seen_inside = locks
            .with_owner(&first, || {
                locks.with_owner(&second, || Ok(locks.len()))
            })
            .unwrap();
        assert_eq!(seen_inside, 2);
        assert!(locks.is_empty());

        let id = Uuid::new_v4();
        let failed: CalendarResult<()> =
            locks.with_owner(&first, || Err(CalendarError::EventNotFound(id)));
        assert!(failed.is_err());
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn poisoned_owner_lock_is_reported() {
        let locks = Arc::new(GeneratorLocks::new());
        let owner = OwnerRef::new("reservation", Uuid::new_v4());
        let (poisoner, poisoned_owner) = (Arc::clone(&locks), owner.clone());
        let _ = thread::spawn(move || {
            let _ = poisoner.with_owner(&poisoned_owner, || -> CalendarResult<()> {
                panic!("reconcile blew up")
            });
        })
        .join();

        let result = locks.with_owner(&owner, || Ok(()));
        assert!(matches!(result, Err(CalendarError::LockPoisoned(o)) if o == owner));
    }

    #[test]
    fn errors_from_the_closure_pass_through() {
        let owner = OwnerRef::new("recurrent_event", Uuid::new_v4());
        let id = Uuid::new_v4();
        let result: CalendarResult<()> = GeneratorLocks::global()
            .with_owner(&owner, || Err(CalendarError::EventNotFound(id)));
        assert!(matches!(result, Err(CalendarError::EventNotFound(missing)) if missing == id));
    }
}
