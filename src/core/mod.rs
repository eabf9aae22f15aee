pub mod checks;
pub mod generator;
pub mod locks;
pub mod owners;
pub mod reconcile;

pub use checks::{check_events, fix_problem, DataProblem, ProblemKind};
pub use generator::{EventGenerator, ReconcileOptions};
pub use locks::GeneratorLocks;
pub use owners::{RecurrentEvent, Reservation};
pub use reconcile::{
    move_to_next, purge_auto_events, reconcile, resolve_conflicts, MoveOutcome,
    ReconcileReport, Resolution, UnresolvedConflict,
};
