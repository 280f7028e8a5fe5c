//! Input and result validation for allocation problems.
//!
//! Before allocation, checks the structural integrity of tasks and robots:
//! - Duplicate IDs
//! - Non-positive or non-finite durations
//! - Missing or self-referencing predecessors
//! - Circular precedence dependencies (DAG validation)
//! - Tasks no robot is capable of (heterogeneous fleets)
//!
//! After allocation, checks the resulting schedule for tasks owned by more
//! than one robot in exclusive mode, unscheduled tasks, precedence
//! violations and deadline misses.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dcop::AssignmentMode;
use crate::models::{Schedule, Task, TaskId, Violation};
use crate::worker::Worker;

const TIME_EPSILON: f64 = 1e-9;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A task duration is zero, negative, or not finite.
    InvalidDuration,
    /// A task references a predecessor that doesn't exist.
    InvalidPredecessor,
    /// A task lists itself as predecessor.
    SelfDependency,
    /// Precedence graph contains a cycle.
    CyclicDependency,
    /// No robot has every skill a task requires.
    NoCapableWorker,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates tasks and their precedence relation.
///
/// Checks:
/// 1. No duplicate task IDs
/// 2. Durations are positive and finite
/// 3. Predecessors exist and are not the task itself
/// 4. No circular precedence dependencies
pub fn validate_tasks(tasks: &[Task]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }
        if !(task.duration.is_finite() && task.duration > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Task '{}' has invalid duration {}", task.id, task.duration),
            ));
        }
    }

    for task in tasks {
        for &pred in &task.predecessors {
            if pred == task.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SelfDependency,
                    format!("Task '{}' cannot precede itself", task.id),
                ));
            } else if !task_ids.contains(&pred) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!("Task '{}' references unknown predecessor '{}'", task.id, pred),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(tasks) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a full allocation problem.
///
/// Runs [`validate_tasks`], then checks that robot IDs are unique and, when
/// `heterogeneous` is set, that every task has at least one capable robot.
pub fn validate_input<W: Worker>(tasks: &[Task], workers: &[W], heterogeneous: bool) -> ValidationResult {
    let mut errors = validate_tasks(tasks).err().unwrap_or_default();

    let mut worker_ids = HashSet::new();
    for w in workers {
        if !worker_ids.insert(w.id()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate worker ID: {}", w.id()),
            ));
        }
    }

    if heterogeneous {
        for task in tasks {
            if !workers.iter().any(|w| w.is_capable(task)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NoCapableWorker,
                    format!("No worker is capable of task '{}'", task.id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks an allocation result against its tasks.
///
/// Returns every violation found; an empty vector means the schedule is
/// complete and consistent.
pub fn validate_allocation(tasks: &[Task], schedule: &Schedule, mode: AssignmentMode) -> Vec<Violation> {
    let mut violations = Vec::new();

    for task in tasks {
        let owners = schedule.owners_of(task.id);
        if owners.is_empty() {
            violations.push(Violation::unscheduled(
                task.id,
                format!("Task '{}' is on no robot's schedule", task.id),
            ));
            continue;
        }
        if mode == AssignmentMode::Exclusive && owners.len() > 1 {
            violations.push(Violation::duplicate_owner(
                task.id,
                format!("Task '{}' is performed by {} robots: {:?}", task.id, owners.len(), owners),
            ));
        }

        if let (Some(deadline), Some(done)) = (task.deadline, schedule.task_completion_time(task.id)) {
            if done > deadline + TIME_EPSILON {
                violations.push(Violation::deadline_miss(
                    task.id,
                    format!("Task '{}' ends at {done} after its deadline {deadline}", task.id),
                ));
            }
        }

        let Some(start) = schedule.task_start_time(task.id) else {
            continue;
        };
        for &pred in &task.predecessors {
            if let Some(pred_end) = schedule.task_completion_time(pred) {
                if start + TIME_EPSILON < pred_end {
                    violations.push(Violation::precedence_violation(
                        task.id,
                        format!("Task '{}' starts at {start} before '{pred}' ends at {pred_end}", task.id),
                    ));
                }
            }
        }
    }

    violations
}

/// Detects cycles in the precedence graph via topological sort.
fn detect_cycles(tasks: &[Task]) -> Option<ValidationError> {
    // Edge direction: predecessor -> task.
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
    for task in tasks {
        graph.add_node(task.id);
    }
    for task in tasks {
        for &pred in &task.predecessors {
            if pred != task.id && graph.contains_node(pred) {
                graph.add_edge(pred, task.id, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_) => None,
        Err(cycle) => Some(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            format!("Circular dependency detected involving task '{}'", cycle.node_id()),
        )),
    }
}
