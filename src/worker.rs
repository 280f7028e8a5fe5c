//! Worker-side interface consumed by the allocation engine.
//!
//! A worker answers "how much would it cost to fit this task into my
//! schedule, and where?" and accepts commits at a previously quoted
//! position. The engine never looks inside a worker's schedule.

use std::fmt::Debug;

use crate::models::{Assignment, Preconditions, Task, WorkerId};

/// Cheapest insertion of a task into a worker's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion<P> {
    /// Insertion cost in `[0, ∞]`; `f64::INFINITY` means the task does not fit.
    pub cost: f64,
    /// Opaque position to hand back to [`Worker::commit`].
    pub position: P,
}

impl<P> Insertion<P> {
    /// An insertion that does not fit anywhere.
    pub fn infeasible(position: P) -> Self {
        Self {
            cost: f64::INFINITY,
            position,
        }
    }

    /// Whether the task fits.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }
}

/// A worker (robot) owning an evolving temporal schedule.
///
/// Schedules only grow: the engine appends tasks through [`commit`](Self::commit)
/// and never removes them.
pub trait Worker {
    /// Position type quoted by [`min_cost_to_insert`](Self::min_cost_to_insert).
    type Position: Clone + Debug + PartialEq;

    /// Unique worker identifier.
    fn id(&self) -> WorkerId;

    /// Whether the worker can perform the task at all.
    ///
    /// Consulted only when heterogeneity filtering is on.
    fn is_capable(&self, task: &Task) -> bool;

    /// Minimum cost and position of inserting `task` into the current schedule.
    fn min_cost_to_insert(
        &self,
        task: &Task,
        preconditions: &Preconditions,
    ) -> Insertion<Self::Position>;

    /// Inserts `task` at a position previously returned by
    /// [`min_cost_to_insert`](Self::min_cost_to_insert).
    fn commit(&mut self, task: &Task, position: Self::Position, preconditions: &Preconditions);

    /// Every task currently on the schedule, with its times.
    fn all_current_tasks(&self) -> Vec<Assignment>;

    /// End of the last task.
    fn makespan(&self) -> f64;

    /// Optional optimisation pass; returns the resulting assignments.
    fn tighten_schedule(&mut self) -> Vec<Assignment> {
        self.all_current_tasks()
    }
}
