//! In-memory layered precedence graph.
//!
//! Each task moves through three states:
//!
//! | State | Meaning |
//! |-------|---------|
//! | pending | not on any robot yet |
//! | scheduled | reported on at least one robot; finish time known |
//! | retired | scheduled and advanced past; successors may be released |
//!
//! Advancing a task that was never scheduled leaves it pending, so it stays
//! in the first layer and is reconsidered by the next batch.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use tracing::{debug, warn};

use super::{PrecedenceGraph, TaskNode};
use crate::errors::{AllocationError, Result};
use crate::models::{Assignment, Precondition, Preconditions, Task, TaskId};
use crate::validation::validate_tasks;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeState {
    Pending,
    Scheduled { finish: f64 },
    Retired { finish: f64 },
}

/// Precedence DAG over tasks (edge `a -> b` = `a` must finish before `b`).
#[derive(Debug, Clone)]
pub struct LayeredGraph {
    graph: DiGraphMap<TaskId, ()>,
    tasks: BTreeMap<TaskId, Task>,
    priorities: BTreeMap<TaskId, i32>,
    states: BTreeMap<TaskId, NodeState>,
}

impl LayeredGraph {
    /// Builds the graph from tasks and their `predecessors`.
    ///
    /// Fails with [`AllocationError::InvalidInput`] on duplicate ids, unknown
    /// predecessors or cycles.
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        validate_tasks(&tasks).map_err(AllocationError::InvalidInput)?;

        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        for task in &tasks {
            graph.add_node(task.id);
        }
        for task in &tasks {
            for &pred in &task.predecessors {
                graph.add_edge(pred, task.id, ());
            }
        }

        let priorities = tasks.iter().map(|t| (t.id, t.priority)).collect();
        let states = tasks.iter().map(|t| (t.id, NodeState::Pending)).collect();
        let tasks = tasks.into_iter().map(|t| (t.id, t)).collect();

        Ok(Self {
            graph,
            tasks,
            priorities,
            states,
        })
    }

    /// Overrides the layer priority of a task.
    pub fn with_priority(mut self, task: TaskId, priority: i32) -> Self {
        if let Some(p) = self.priorities.get_mut(&task) {
            *p = priority;
        }
        self
    }

    /// Looks up a task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Direct predecessors of a task.
    pub fn predecessors(&self, id: TaskId) -> Vec<TaskId> {
        self.neighbours(id, Direction::Incoming)
    }

    /// Direct successors of a task.
    pub fn successors(&self, id: TaskId) -> Vec<TaskId> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Reported finish time of a scheduled or retired task.
    pub fn finish_time(&self, id: TaskId) -> Option<f64> {
        match self.states.get(&id)? {
            NodeState::Pending => None,
            NodeState::Scheduled { finish } | NodeState::Retired { finish } => Some(*finish),
        }
    }

    /// Whether the graph has been advanced past this task.
    pub fn is_retired(&self, id: TaskId) -> bool {
        matches!(self.states.get(&id), Some(NodeState::Retired { .. }))
    }

    /// Tasks not yet on any robot.
    pub fn pending_tasks(&self) -> Vec<TaskId> {
        self.states
            .iter()
            .filter(|(_, s)| matches!(s, NodeState::Pending))
            .map(|(id, _)| *id)
            .collect()
    }

    fn neighbours(&self, id: TaskId, dir: Direction) -> Vec<TaskId> {
        if !self.graph.contains_node(id) {
            return Vec::new();
        }
        let mut out: Vec<TaskId> = self.graph.neighbors_directed(id, dir).collect();
        out.sort();
        out
    }

    fn node(&self, id: TaskId) -> Option<TaskNode> {
        let task = self.tasks.get(&id)?.clone();
        let priority = self.priorities.get(&id).copied().unwrap_or(task.priority);
        Some(TaskNode { task, priority })
    }

    fn first_layer_ids(&self) -> BTreeSet<TaskId> {
        self.tasks
            .keys()
            .copied()
            .filter(|&id| !self.is_retired(id))
            .filter(|&id| self.predecessors(id).iter().all(|&p| self.is_retired(p)))
            .collect()
    }
}

impl PrecedenceGraph for LayeredGraph {
    fn size(&self) -> usize {
        self.tasks.len()
    }

    fn scheduled_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| !matches!(s, NodeState::Pending))
            .count()
    }

    fn first_layer(&self) -> Vec<TaskNode> {
        self.first_layer_ids()
            .into_iter()
            .filter_map(|id| self.node(id))
            .collect()
    }

    fn second_layer(&self) -> Vec<TaskNode> {
        let first = self.first_layer_ids();
        self.tasks
            .keys()
            .copied()
            .filter(|id| !self.is_retired(*id) && !first.contains(id))
            .filter(|&id| {
                self.predecessors(id)
                    .iter()
                    .filter(|&&p| !self.is_retired(p))
                    .all(|p| first.contains(p))
            })
            .filter_map(|id| self.node(id))
            .collect()
    }

    fn advance(&mut self, task: TaskId) -> Preconditions {
        let finish = match self.states.get(&task).copied() {
            Some(NodeState::Scheduled { finish }) | Some(NodeState::Retired { finish }) => finish,
            Some(NodeState::Pending) => {
                debug!(task = %task, "task not scheduled yet; keeping it in the graph");
                return Preconditions::new();
            }
            None => {
                warn!(task = %task, "advance for unknown task; ignoring");
                return Preconditions::new();
            }
        };
        self.states.insert(task, NodeState::Retired { finish });

        let mut out = Preconditions::new();
        for succ in self.successors(task) {
            let earliest = self
                .predecessors(succ)
                .iter()
                .filter_map(|&p| match self.states.get(&p) {
                    Some(NodeState::Retired { finish }) => Some(*finish),
                    _ => None,
                })
                .fold(0.0, f64::max);
            out.insert(succ, Precondition::not_before(earliest));
        }
        debug!(task = %task, finish, released = out.len(), "precedence graph advanced");
        out
    }

    fn report_worker_tasks(&mut self, tasks: &[Assignment]) {
        for a in tasks {
            let Some(state) = self.states.get_mut(&a.task_id) else {
                warn!(task = %a.task_id, "reported task is not in the graph");
                continue;
            };
            match *state {
                NodeState::Pending => *state = NodeState::Scheduled { finish: a.end },
                NodeState::Scheduled { finish } => {
                    *state = NodeState::Scheduled {
                        finish: finish.max(a.end),
                    }
                }
                NodeState::Retired { .. } => {}
            }
        }
    }
}
