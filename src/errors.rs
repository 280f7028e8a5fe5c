//! Crate-wide error type.
//!
//! Only fatal conditions are errors. An unsolvable round (no worker can fit
//! any task of the batch) is a normal outcome of the allocation loop and is
//! reported through [`AllocationStats`](crate::scheduler::AllocationStats).

use thiserror::Error;

use crate::models::{TaskId, WorkerId};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AllocationError {
    /// The precedence graph stopped advancing before every task was scheduled.
    #[error("allocation is unsolvable: {scheduled} of {total} tasks scheduled (starved: {starved:?})")]
    Unsolvable {
        scheduled: usize,
        total: usize,
        starved: Vec<TaskId>,
    },

    /// The solver produced values but none of them commits to a task.
    #[error("solver returned {assigned} assignments but none commits to a task")]
    ZeroAssignment { assigned: usize },

    /// The solver committed a worker to a task that is not part of the batch.
    #[error("solver assigned worker {worker} to task {task} outside the current batch")]
    UnknownAssignment { worker: WorkerId, task: TaskId },

    /// A task has more candidate robots than a utility table can enumerate.
    #[error("task {task} has {candidates} candidate robots; a utility table holds at most {max}")]
    TooManyCandidates {
        task: TaskId,
        candidates: usize,
        max: usize,
    },

    #[error("makespan is infinite; an unscheduled task slipped through")]
    InfiniteMakespan,

    #[error("invalid input: {0:?}")]
    InvalidInput(Vec<ValidationError>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AllocationError>;
