//! Turns solver output into schedule commits.
//!
//! Every robot reports at most one value per round, so a robot is awarded at
//! most one task per round and the insertion position quoted at formulation
//! time is still valid when it is committed.

use std::collections::BTreeMap;

use tracing::{debug, error};

use super::cost_table::CostTable;
use super::solver::AssignmentResult;
use super::utility::AssignmentMode;
use crate::errors::{AllocationError, Result};
use crate::models::{Preconditions, Task, TaskId, WorkerId};
use crate::worker::Worker;

/// Robots committing to each task, sorted by robot id.
pub fn collect_awards(results: &AssignmentResult) -> BTreeMap<TaskId, Vec<WorkerId>> {
    let mut awards: BTreeMap<TaskId, Vec<WorkerId>> = BTreeMap::new();
    for (&worker, decision) in results {
        if decision.is_commit() {
            awards.entry(decision.task()).or_default().push(worker);
        }
    }
    awards
}

/// Applies a round's solver output.
///
/// In exclusive mode only the last committing robot (by id) keeps a task;
/// in collaborative mode every committing robot does. Returns the robots
/// each task was committed to this round.
///
/// # Errors
/// - [`AllocationError::ZeroAssignment`] if the result is non-empty but
///   nobody commits.
/// - [`AllocationError::UnknownAssignment`] if a commit names a task outside
///   `batch`, or a robot that was never quoted a feasible position for it.
///
/// Both are checked before any schedule is touched.
pub fn resolve<W: Worker>(
    mode: AssignmentMode,
    results: &AssignmentResult,
    cost_table: &CostTable<W::Position>,
    batch: &BTreeMap<TaskId, Task>,
    workers: &mut [W],
    preconditions: &Preconditions,
) -> Result<BTreeMap<TaskId, Vec<WorkerId>>> {
    let awards = collect_awards(results);
    if awards.is_empty() {
        if results.is_empty() {
            return Ok(BTreeMap::new());
        }
        error!(assigned = results.len(), "solver returned no commit at all");
        return Err(AllocationError::ZeroAssignment {
            assigned: results.len(),
        });
    }

    let index: BTreeMap<WorkerId, usize> = workers
        .iter()
        .enumerate()
        .map(|(i, w)| (w.id(), i))
        .collect();

    let mut plan = Vec::new();
    for (task_id, mut candidates) in awards {
        if mode == AssignmentMode::Exclusive {
            candidates = candidates.split_off(candidates.len().saturating_sub(1));
        }
        for worker in candidates {
            let unknown = AllocationError::UnknownAssignment {
                worker,
                task: task_id,
            };
            let Some(task) = batch.get(&task_id) else {
                error!(task = %task_id, worker = %worker, "commit outside the current batch");
                return Err(unknown);
            };
            let (Some(entry), Some(&slot)) = (cost_table.get(task_id, worker), index.get(&worker)) else {
                error!(task = %task_id, worker = %worker, "commit without a cost quote");
                return Err(unknown);
            };
            if !entry.is_feasible() {
                error!(task = %task_id, worker = %worker, "commit of an infeasible insertion");
                return Err(unknown);
            }
            plan.push((task, slot, entry.position.clone()));
        }
    }

    let mut committed: BTreeMap<TaskId, Vec<WorkerId>> = BTreeMap::new();
    for (task, slot, position) in plan {
        let worker = &mut workers[slot];
        debug!(task = %task.id, worker = %worker.id(), position = ?position, "committing task");
        worker.commit(task, position, preconditions);
        committed.entry(task.id).or_default().push(worker.id());
    }
    Ok(committed)
}
