//! Precedence graph interface.
//!
//! The allocation loop consumes tasks layer by layer: the *first layer* holds
//! tasks whose predecessors are all done, the *second layer* the tasks one
//! precedence step further out. After a batch is allocated the graph is told
//! which tasks sit on which robots and is advanced past the batch, returning
//! timing preconditions for the successors.
//!
//! - [`LayeredGraph`] is the in-memory implementation backed by `petgraph`.

mod layered;

pub use layered::LayeredGraph;

use crate::models::{Assignment, Preconditions, Task, TaskId};

/// A task as seen through the precedence graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    pub task: Task,
    /// Layer priority (higher = more urgent).
    pub priority: i32,
}

impl TaskNode {
    pub fn id(&self) -> TaskId {
        self.task.id
    }
}

/// Query/update interface of a precedence graph.
pub trait PrecedenceGraph {
    /// Total number of tasks in the problem.
    fn size(&self) -> usize;

    /// Number of tasks already placed on some robot's schedule.
    fn scheduled_count(&self) -> usize;

    /// Tasks with no unfinished predecessors.
    fn first_layer(&self) -> Vec<TaskNode>;

    /// Tasks whose unfinished predecessors all lie in the first layer.
    fn second_layer(&self) -> Vec<TaskNode>;

    /// Records that `task` has been processed and returns the preconditions
    /// this implies for other tasks.
    fn advance(&mut self, task: TaskId) -> Preconditions;

    /// Reports the tasks currently on one robot's schedule.
    fn report_worker_tasks(&mut self, tasks: &[Assignment]);
}
