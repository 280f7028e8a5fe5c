//! Schedule (solution) model.
//!
//! A schedule collects the task-robot-time assignments of a whole fleet
//! after allocation. Checking it against the task set produces
//! [`Violation`]s (see `validation::validate_allocation`).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{TaskId, WorkerId};

/// A complete fleet schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Task assignments (task → robot × time).
    pub assignments: Vec<Assignment>,
}

/// A task-robot-time assignment.
///
/// In collaborative mode the same task appears once per participating robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned task.
    pub task_id: TaskId,
    /// Robot performing it.
    pub worker_id: WorkerId,
    /// Start of processing on site.
    pub start: f64,
    /// End of processing.
    pub end: f64,
    /// Travel time spent reaching the task location.
    pub travel: f64,
}

/// A violation found in a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related task.
    pub task_id: TaskId,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Task ends after its deadline.
    DeadlineMiss,
    /// Task performed by several robots although collaboration is off.
    DuplicateOwner,
    /// Task never made it onto any robot.
    Unscheduled,
    /// Task started before a predecessor finished.
    PrecedenceViolation,
}

impl Assignment {
    /// Creates a new assignment without travel.
    pub fn new(task_id: TaskId, worker_id: WorkerId, start: f64, end: f64) -> Self {
        Self {
            task_id,
            worker_id,
            start,
            end,
            travel: 0.0,
        }
    }

    /// Sets the travel time.
    pub fn with_travel(mut self, travel: f64) -> Self {
        self.travel = travel;
        self
    }

    /// Processing duration (end - start).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl Violation {
    pub fn deadline_miss(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::DeadlineMiss,
            task_id,
            message: message.into(),
            severity: 80,
        }
    }

    pub fn duplicate_owner(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::DuplicateOwner,
            task_id,
            message: message.into(),
            severity: 90,
        }
    }

    pub fn unscheduled(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::Unscheduled,
            task_id,
            message: message.into(),
            severity: 100,
        }
    }

    pub fn precedence_violation(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::PrecedenceViolation,
            task_id,
            message: message.into(),
            severity: 95,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Makespan: latest end time across all assignments.
    pub fn makespan(&self) -> f64 {
        self.assignments.iter().map(|a| a.end).fold(0.0, f64::max)
    }

    /// Total travel time across the fleet.
    pub fn total_travel(&self) -> f64 {
        self.assignments.iter().map(|a| a.travel).sum()
    }

    /// Returns all assignments of a task (several in collaborative mode).
    pub fn assignments_for_task(&self, task_id: TaskId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.task_id == task_id)
            .collect()
    }

    /// Returns all assignments of a robot, in timeline order.
    pub fn assignments_for_worker(&self, worker_id: WorkerId) -> Vec<&Assignment> {
        let mut out: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.worker_id == worker_id)
            .collect();
        out.sort_by(|a, b| a.start.total_cmp(&b.start));
        out
    }

    /// Robots performing a task.
    pub fn owners_of(&self, task_id: TaskId) -> BTreeSet<WorkerId> {
        self.assignments
            .iter()
            .filter(|a| a.task_id == task_id)
            .map(|a| a.worker_id)
            .collect()
    }

    /// Start time of a task (earliest start among its assignments).
    pub fn task_start_time(&self, task_id: TaskId) -> Option<f64> {
        self.assignments_for_task(task_id)
            .iter()
            .map(|a| a.start)
            .reduce(f64::min)
    }

    /// Completion time of a task (latest end among its assignments).
    pub fn task_completion_time(&self, task_id: TaskId) -> Option<f64> {
        self.assignments_for_task(task_id)
            .iter()
            .map(|a| a.end)
            .reduce(f64::max)
    }

    /// Per-robot makespan.
    pub fn makespan_by_worker(&self) -> BTreeMap<WorkerId, f64> {
        let mut out: BTreeMap<WorkerId, f64> = BTreeMap::new();
        for a in &self.assignments {
            let entry = out.entry(a.worker_id).or_insert(0.0);
            *entry = entry.max(a.end);
        }
        out
    }

    /// Distinct tasks present in the schedule.
    pub fn scheduled_tasks(&self) -> BTreeSet<TaskId> {
        self.assignments.iter().map(|a| a.task_id).collect()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}
