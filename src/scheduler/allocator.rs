//! Precedence-layered DCOP allocation loop.
//!
//! # Algorithm
//!
//! ```text
//! loop:
//!   if every task is scheduled: done
//!   batch := first layer (optionally restricted by priority)
//!   while batch not empty:                       (one DCOP round)
//!     formulate factor graph over batch          (fresh cost table)
//!     no instance or empty result → abandon the rest of the batch
//!     solve, resolve, drop committed tasks from the batch
//!   report every robot's tasks to the precedence graph
//!   advance the graph past every batch task; merge preconditions
//! ```
//!
//! An iteration that commits nothing over the full first layer, and leaves
//! the graph unchanged, would repeat forever; the loop stops with
//! [`AllocationError::Unsolvable`] instead.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::AllocatorConfig;
use crate::dcop::{resolve, run_solver, FactorGraphBuilder, MaxSum, MaxSumSolver};
use crate::errors::{AllocationError, Result};
use crate::models::{Preconditions, Schedule, Task, TaskId};
use crate::precedence::{PrecedenceGraph, TaskNode};
use crate::worker::Worker;

/// Counters of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationStats {
    /// Outer (precedence layer) iterations.
    pub iterations: usize,
    /// DCOP rounds over all iterations.
    pub rounds: usize,
    /// Rounds abandoned because nothing could be allocated.
    pub unsolvable_rounds: usize,
    /// (task, robot) commits.
    pub commits: usize,
}

/// Result of a successful allocation.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Every robot's final timeline.
    pub schedule: Schedule,
    pub stats: AllocationStats,
}

/// Allocates a precedence graph of tasks to a fleet, one layer at a time.
///
/// # Usage
/// ```ignore
/// let mut graph = LayeredGraph::new(tasks)?;
/// let mut allocator = DcopAllocator::new(AllocatorConfig::default());
/// let allocation = allocator.allocate(&mut graph, &mut robots)?;
/// ```
#[derive(Debug)]
pub struct DcopAllocator<S = MaxSum> {
    config: AllocatorConfig,
    solver: S,
    preconditions: Preconditions,
    rng: StdRng,
}

impl DcopAllocator<MaxSum> {
    /// Creates an allocator using the bundled Max-Sum solver.
    pub fn new(config: AllocatorConfig) -> Self {
        Self::with_solver(config, MaxSum::new())
    }
}

impl<S: MaxSumSolver> DcopAllocator<S> {
    /// Creates an allocator with a custom solver.
    pub fn with_solver(config: AllocatorConfig, solver: S) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            solver,
            preconditions: Preconditions::new(),
            rng,
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Preconditions accumulated from the precedence graph so far.
    pub fn preconditions(&self) -> &Preconditions {
        &self.preconditions
    }

    /// Allocates every task of `graph` to `workers`.
    ///
    /// Robot schedules are only ever extended. On error they keep whatever
    /// was committed before the failure.
    pub fn allocate<G, W>(&mut self, graph: &mut G, workers: &mut [W]) -> Result<Allocation>
    where
        G: PrecedenceGraph,
        W: Worker,
    {
        let total = graph.size();
        let mut stats = AllocationStats::default();
        let mut starved: BTreeSet<TaskId> = BTreeSet::new();
        let mut stalled = false;

        loop {
            let scheduled = graph.scheduled_count();
            let first = graph.first_layer();
            let second = graph.second_layer();
            debug!(
                iteration = stats.iterations,
                scheduled,
                first_layer = first.len(),
                second_layer = second.len(),
                "precedence layers"
            );

            if scheduled >= total {
                info!(
                    tasks = total,
                    iterations = stats.iterations,
                    rounds = stats.rounds,
                    "all tasks have been scheduled"
                );
                break;
            }
            if first.is_empty() {
                error!(scheduled, total, "first layer is empty with tasks left");
                return Err(AllocationError::Unsolvable {
                    scheduled,
                    total,
                    starved: starved.into_iter().collect(),
                });
            }

            let batch = self.select_batch(&first, &second, stalled);
            let full_pass = batch.len() == first.len();
            let committed = self.allocate_batch(&batch, workers, &mut stats, &mut starved)?;

            for worker in workers.iter_mut() {
                let tasks = if self.config.tighten_schedule {
                    worker.tighten_schedule()
                } else {
                    worker.all_current_tasks()
                };
                graph.report_worker_tasks(&tasks);
                debug!(worker = %worker.id(), makespan = worker.makespan(), tasks = tasks.len(), "robot schedule");
            }

            for node in &batch {
                let released = graph.advance(node.id());
                self.preconditions.extend(released);
            }
            stats.iterations += 1;

            if committed.is_empty() {
                let unchanged = graph.scheduled_count() == scheduled
                    && layer_ids(&graph.first_layer()) == layer_ids(&first);
                if full_pass && unchanged {
                    starved.extend(first.iter().map(TaskNode::id));
                    error!(scheduled, total, starved = ?starved, "no task of the first layer can be allocated");
                    return Err(AllocationError::Unsolvable {
                        scheduled,
                        total,
                        starved: starved.into_iter().collect(),
                    });
                }
                stalled = true;
            } else {
                stalled = false;
            }
        }

        let mut schedule = Schedule::new();
        for worker in workers.iter() {
            for assignment in worker.all_current_tasks() {
                schedule.add_assignment(assignment);
            }
        }
        Ok(Allocation { schedule, stats })
    }

    /// First layer, restricted in priority mode to the tasks that outrank
    /// every task of the second layer. An empty second layer sets the bar
    /// at priority 0.
    fn select_batch(&self, first: &[TaskNode], second: &[TaskNode], stalled: bool) -> Vec<TaskNode> {
        if !self.config.use_priority || stalled {
            return first.to_vec();
        }
        let ceiling = second.iter().map(|n| n.priority).max().unwrap_or(0);
        let batch: Vec<TaskNode> = first
            .iter()
            .filter(|n| n.priority > ceiling)
            .cloned()
            .collect();
        if batch.is_empty() {
            debug!(ceiling, "no first-layer task outranks the second layer; using the whole layer");
            return first.to_vec();
        }
        batch
    }

    /// Runs DCOP rounds until the batch is empty or cannot progress.
    fn allocate_batch<W: Worker>(
        &mut self,
        batch: &[TaskNode],
        workers: &mut [W],
        stats: &mut AllocationStats,
        starved: &mut BTreeSet<TaskId>,
    ) -> Result<BTreeSet<TaskId>> {
        let mut remaining: BTreeMap<TaskId, Task> =
            batch.iter().map(|n| (n.id(), n.task.clone())).collect();
        let mut committed = BTreeSet::new();

        while !remaining.is_empty() {
            stats.rounds += 1;
            debug!(round = stats.rounds, tasks = ?remaining.keys().collect::<Vec<_>>(), "creating dcop");

            let formulation = FactorGraphBuilder::new(self.config.mode, &self.preconditions)
                .with_heterogeneous(self.config.heterogeneous)
                .build(&remaining, workers, &mut self.rng)?;
            debug!(round = stats.rounds, cost_table = ?formulation.cost_table, "cost table");

            let Some(instance) = formulation.instance else {
                warn!(tasks = ?remaining.keys().collect::<Vec<_>>(), "tasks cannot be allocated");
                stats.unsolvable_rounds += 1;
                starved.extend(remaining.keys().copied());
                break;
            };

            let results = run_solver(&mut self.solver, &instance, &self.config.solver);
            if results.is_empty() {
                warn!(tasks = ?remaining.keys().collect::<Vec<_>>(), "solver returned no assignment");
                stats.unsolvable_rounds += 1;
                starved.extend(remaining.keys().copied());
                break;
            }

            let done = resolve(
                self.config.mode,
                &results,
                &formulation.cost_table,
                &remaining,
                workers,
                &self.preconditions,
            )?;
            for (task, owners) in done {
                stats.commits += owners.len();
                remaining.remove(&task);
                starved.remove(&task);
                committed.insert(task);
            }
        }

        Ok(committed)
    }
}

fn layer_ids(layer: &[TaskNode]) -> BTreeSet<TaskId> {
    layer.iter().map(TaskNode::id).collect()
}
