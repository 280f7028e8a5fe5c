//! Factor graph construction for one batch of ready tasks.
//!
//! # Algorithm
//! 1. One function per batch task, owned by a uniformly random agent.
//! 2. One variable per robot. For every task the robot may perform, the
//!    robot's cheapest insertion is quoted into the cost table; a finite
//!    quote links variable and function and adds the task to the domain.
//! 3. A robot with an empty domain is dropped for this round. Otherwise its
//!    domain is every candidate commit followed by every matching decline.
//! 4. Every function with at least one neighbour tabulates the utility of
//!    all `2^k` commit/decline combinations of its `k` slots. More than
//!    [`MAX_FUNCTION_ARITY`] slots is an error.
//!
//! No variable at all means the batch cannot be allocated this round; the
//! builder then returns no instance, together with the cost table.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::trace;

use super::cost_table::{CostEntry, CostTable};
use super::factor_graph::{
    Agent, DcopInstance, Decision, Function, FunctionIdx, UtilityTable, Variable, VariableIdx,
    MAX_FUNCTION_ARITY,
};
use super::utility::{joint_utility, AssignmentMode};
use crate::errors::{AllocationError, Result};
use crate::models::{Preconditions, Task, TaskId};
use crate::worker::Worker;

/// Result of formulating one round.
#[derive(Debug, Clone)]
pub struct Formulation<P> {
    /// `None` if no robot can fit any task of the batch.
    pub instance: Option<DcopInstance>,
    pub cost_table: CostTable<P>,
}

/// Builds DCOP instances from a batch and the fleet.
#[derive(Debug, Clone)]
pub struct FactorGraphBuilder<'a> {
    mode: AssignmentMode,
    heterogeneous: bool,
    preconditions: &'a Preconditions,
}

impl<'a> FactorGraphBuilder<'a> {
    pub fn new(mode: AssignmentMode, preconditions: &'a Preconditions) -> Self {
        Self {
            mode,
            heterogeneous: false,
            preconditions,
        }
    }

    /// Enables capability filtering.
    pub fn with_heterogeneous(mut self, heterogeneous: bool) -> Self {
        self.heterogeneous = heterogeneous;
        self
    }

    /// Formulates one round over `batch`.
    ///
    /// `rng` only decides which agent owns each function.
    pub fn build<W: Worker, R: Rng>(
        &self,
        batch: &BTreeMap<TaskId, Task>,
        workers: &[W],
        rng: &mut R,
    ) -> Result<Formulation<W::Position>> {
        let mut cost_table = CostTable::new();

        let mut agents: Vec<Agent> = workers
            .iter()
            .map(|w| Agent {
                worker: w.id(),
                variables: Vec::new(),
                functions: Vec::new(),
            })
            .collect();

        let mut functions: Vec<Function> = batch
            .keys()
            .map(|&task| Function {
                task,
                neighbours: Vec::new(),
                utilities: UtilityTable::default(),
            })
            .collect();

        if !agents.is_empty() {
            for f in 0..functions.len() {
                let owner = rng.random_range(0..agents.len());
                agents[owner].functions.push(FunctionIdx(f));
            }
        }

        let mut variables: Vec<Variable> = Vec::new();
        for (agent, worker) in agents.iter_mut().zip(workers) {
            let candidate = VariableIdx(variables.len());
            let mut linked = Vec::new();

            for (f, task) in batch.values().enumerate() {
                if self.heterogeneous && !worker.is_capable(task) {
                    continue;
                }
                let quote = worker.min_cost_to_insert(task, self.preconditions);
                let feasible = quote.is_feasible();
                cost_table.insert(
                    task.id,
                    worker.id(),
                    CostEntry::new(quote.cost, quote.position),
                );
                if feasible {
                    functions[f].neighbours.push(candidate);
                    linked.push(FunctionIdx(f));
                }
            }

            if linked.is_empty() {
                trace!(worker = %worker.id(), "no feasible task in batch; dropping variable");
                continue;
            }

            let commits = linked.iter().map(|f| Decision::Commit(functions[f.0].task));
            let declines = linked.iter().map(|f| Decision::Decline(functions[f.0].task));
            let domain = commits.chain(declines).collect();

            agent.variables.push(candidate);
            variables.push(Variable {
                worker: worker.id(),
                domain,
                neighbours: linked,
            });
        }

        for function in &mut functions {
            if function.neighbours.is_empty() {
                continue;
            }
            if function.neighbours.len() > MAX_FUNCTION_ARITY {
                return Err(AllocationError::TooManyCandidates {
                    task: function.task,
                    candidates: function.neighbours.len(),
                    max: MAX_FUNCTION_ARITY,
                });
            }
            let values: Vec<f64> = function
                .neighbours
                .iter()
                .map(|&v| cost_table.utility(function.task, variables[v.0].worker))
                .collect();
            function.utilities = UtilityTable::tabulate(values.len(), |mask| {
                let committed: Vec<f64> = values
                    .iter()
                    .enumerate()
                    .filter(|(slot, _)| mask & (1 << slot) != 0)
                    .map(|(_, &u)| u)
                    .collect();
                joint_utility(self.mode, &committed)
            });
        }

        let instance = if variables.is_empty() {
            None
        } else {
            Some(DcopInstance {
                variables,
                functions,
                agents,
            })
        };

        Ok(Formulation {
            instance,
            cost_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcop::utility::INFEASIBLE_UTILITY;
    use crate::models::{Location, Robot, WorkerId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tid(raw: u32) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    fn batch(tasks: Vec<Task>) -> BTreeMap<TaskId, Task> {
        tasks.into_iter().map(|t| (t.id, t)).collect()
    }

    /// Robot 1 at the origin, robot 2 further away from every task.
    fn fleet() -> Vec<Robot> {
        vec![
            Robot::new(1, Location::new(0.0, 0.0)),
            Robot::new(2, Location::new(-2.0, 0.0)),
        ]
    }

    #[test]
    fn test_build_two_robots_one_task() {
        let pre = Preconditions::new();
        // Robot 1: travel 1 + duration 1 = 2; robot 2: travel 3 + 1 = 4.
        let b = batch(vec![Task::new(tid(1)).at(1.0, 0.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        let f = FactorGraphBuilder::new(AssignmentMode::Exclusive, &pre)
            .build(&b, &fleet(), &mut rng)
            .unwrap();

        let instance = f.instance.unwrap();
        assert_eq!(instance.variables.len(), 2);
        assert_eq!(instance.functions.len(), 1);
        assert_eq!(instance.agents.len(), 2);
        assert_eq!(
            instance.agents.iter().map(|a| a.functions.len()).sum::<usize>(),
            1
        );

        assert!((f.cost_table.utility(tid(1), WorkerId(1)) - 0.5).abs() < 1e-10);
        assert!((f.cost_table.utility(tid(1), WorkerId(2)) - 0.25).abs() < 1e-10);

        let table = &instance.functions[0].utilities;
        assert_eq!(table.get(0b00), Some(INFEASIBLE_UTILITY));
        assert!((table.get(0b01).unwrap() - 0.5).abs() < 1e-10);
        assert!((table.get(0b10).unwrap() - 0.25).abs() < 1e-10);
        assert_eq!(table.get(0b11), Some(INFEASIBLE_UTILITY));
    }

    #[test]
    fn test_collaborative_table() {
        let pre = Preconditions::new();
        // Costs 0.5 and 0.25 invert to table values 2 and 4.
        let b = batch(vec![Task::new(tid(1)).at(0.0, 0.0).with_duration(0.5)]);
        let robots = vec![
            Robot::new(1, Location::new(0.0, 0.0)),
            Robot::new(2, Location::new(0.0, 0.0)).with_alpha(0.5),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let f = FactorGraphBuilder::new(AssignmentMode::Collaborative, &pre)
            .build(&b, &robots, &mut rng)
            .unwrap();
        let table = &f.instance.unwrap().functions[0].utilities;

        assert!((table.get(0b11).unwrap() - 3.0_f64.ln()).abs() < 1e-10);
        assert!((table.get(0b01).unwrap() - 2.0_f64.ln()).abs() < 1e-10);
        assert!((table.get(0b10).unwrap() - 4.0_f64.ln()).abs() < 1e-10);
        assert_eq!(table.get(0b00), Some(INFEASIBLE_UTILITY));
    }

    #[test]
    fn test_domain_commits_then_declines() {
        let pre = Preconditions::new();
        let b = batch(vec![Task::new(tid(5)).at(1.0, 0.0), Task::new(tid(7)).at(2.0, 0.0)]);
        let robots = vec![Robot::new(1, Location::default())];
        let mut rng = StdRng::seed_from_u64(0);
        let f = FactorGraphBuilder::new(AssignmentMode::Exclusive, &pre)
            .build(&b, &robots, &mut rng)
            .unwrap();

        let domain = &f.instance.unwrap().variables[0].domain;
        let signed: Vec<i64> = domain.iter().map(|d| d.signed()).collect();
        assert_eq!(signed, vec![5, 7, -5, -7]);
    }

    #[test]
    fn test_incapable_robot_is_never_a_neighbour() {
        let pre = Preconditions::new();
        let b = batch(vec![Task::new(tid(1)).at(1.0, 0.0).requires("arm")]);
        let robots = vec![
            // Cheapest by far, but lacks the skill.
            Robot::new(1, Location::new(1.0, 0.0)),
            Robot::new(2, Location::new(50.0, 0.0)).with_skill("arm"),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let f = FactorGraphBuilder::new(AssignmentMode::Exclusive, &pre)
            .with_heterogeneous(true)
            .build(&b, &robots, &mut rng)
            .unwrap();

        let instance = f.instance.unwrap();
        assert_eq!(instance.neighbours_of(tid(1)), vec![WorkerId(2)]);
        assert!(instance.variable_for(WorkerId(1)).is_none());
        assert!(f.cost_table.get(tid(1), WorkerId(1)).is_none());
    }

    #[test]
    fn test_infeasible_robot_is_dropped() {
        let pre = Preconditions::new();
        let b = batch(vec![Task::new(tid(1)).at(5.0, 0.0).with_deadline(7.0)]);
        let robots = vec![
            Robot::new(1, Location::new(0.0, 0.0)),
            Robot::new(2, Location::new(100.0, 0.0)),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let f = FactorGraphBuilder::new(AssignmentMode::Exclusive, &pre)
            .build(&b, &robots, &mut rng)
            .unwrap();

        // Robot 2 is quoted but cannot make the deadline.
        assert!(!f.cost_table.get(tid(1), WorkerId(2)).unwrap().is_feasible());
        let instance = f.instance.unwrap();
        assert_eq!(instance.variables.len(), 1);
        assert_eq!(instance.neighbours_of(tid(1)), vec![WorkerId(1)]);
    }

    #[test]
    fn test_no_instance_when_nothing_fits() {
        let pre = Preconditions::new();
        let b = batch(vec![Task::new(tid(1)).at(50.0, 0.0).with_deadline(1.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        let f = FactorGraphBuilder::new(AssignmentMode::Exclusive, &pre)
            .build(&b, &fleet(), &mut rng)
            .unwrap();
        assert!(f.instance.is_none());
        assert_eq!(f.cost_table.len(), 2);
    }

    #[test]
    fn test_build_is_idempotent() {
        let pre = Preconditions::new();
        let b = batch(vec![
            Task::new(tid(1)).at(1.0, 0.0),
            Task::new(tid(2)).at(3.0, 1.0),
            Task::new(tid(3)).at(-1.0, 2.0),
        ]);
        let robots = fleet();
        let builder = FactorGraphBuilder::new(AssignmentMode::Collaborative, &pre);

        let first = builder
            .build(&b, &robots, &mut StdRng::seed_from_u64(11))
            .unwrap();
        let second = builder
            .build(&b, &robots, &mut StdRng::seed_from_u64(11))
            .unwrap();
        assert_eq!(first.cost_table, second.cost_table);
        assert_eq!(first.instance, second.instance);
    }

    #[test]
    fn test_too_many_candidates_is_an_error() {
        let pre = Preconditions::new();
        let b = batch(vec![Task::new(tid(1)).at(1.0, 0.0)]);
        let robots: Vec<Robot> = (1..=MAX_FUNCTION_ARITY as u32 + 1)
            .map(|id| Robot::new(id, Location::new(0.0, 0.0)))
            .collect();
        let mut rng = StdRng::seed_from_u64(0);

        let err = FactorGraphBuilder::new(AssignmentMode::Collaborative, &pre)
            .build(&b, &robots, &mut rng)
            .unwrap_err();
        match err {
            AllocationError::TooManyCandidates {
                task,
                candidates,
                max,
            } => {
                assert_eq!(task, tid(1));
                assert_eq!(candidates, MAX_FUNCTION_ARITY + 1);
                assert_eq!(max, MAX_FUNCTION_ARITY);
            }
            other => panic!("unexpected error: {other}"),
        }

        // A small fleet on the same batch still tabulates.
        let f = FactorGraphBuilder::new(AssignmentMode::Exclusive, &pre)
            .build(&b, &robots[..MAX_FUNCTION_ARITY.min(4)], &mut rng)
            .unwrap();
        assert!(f.instance.is_some());
    }
}
