//! Max-Sum message passing.
//!
//! The engine talks to its solver through [`MaxSumSolver`]. [`MaxSum`] is
//! the bundled implementation: a synchronous, in-process simulation of the
//! distributed protocol with a fixed iteration budget.
//!
//! # Messages
//! For function `f` with slots `v_1..v_k` and variable `v` with domain `D_v`:
//!
//! - `r(f→v)(d) = max over the other slots' commit/decline choices of
//!   U_f(choice) + Σ q(v_j→f)(choice_j)`, where a value commits for `f` iff it
//!   equals `Commit(f.task)`. A neighbour's "decline" term is its best
//!   message over every value that does not commit to `f`.
//! - `q(v→f)(d) = Σ_{g ≠ f} r(g→v)(d)`, shifted to zero mean.
//!
//! A variable settles on the argmax of `Σ_f r(f→v)`; ties go to the first
//! domain entry.
//!
//! # Reference
//! Farinelli et al. (2008), "Decentralised coordination of low-power embedded
//! devices using the max-sum algorithm", AAMAS

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::factor_graph::{DcopInstance, Decision, MAX_FUNCTION_ARITY};
use crate::models::WorkerId;

/// Value each robot settled on.
pub type AssignmentResult = BTreeMap<WorkerId, Decision>;

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Message-passing iterations per round.
    pub iterations: usize,
    /// Compute values only after the last iteration instead of after each.
    pub update_only_at_end: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            update_only_at_end: false,
        }
    }
}

impl SolverConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_update_only_at_end(mut self, update_only_at_end: bool) -> Self {
        self.update_only_at_end = update_only_at_end;
        self
    }
}

/// A maximisation solver over a [`DcopInstance`].
///
/// Implementations must run to completion within the configured budget and
/// return one value from each variable's domain.
pub trait MaxSumSolver {
    fn solve(&mut self, instance: &DcopInstance, config: &SolverConfig) -> AssignmentResult;
}

/// Runs `solver` once. Non-convergence is not retried; the values reported
/// after the budget are final.
pub fn run_solver<S: MaxSumSolver + ?Sized>(
    solver: &mut S,
    instance: &DcopInstance,
    config: &SolverConfig,
) -> AssignmentResult {
    debug!(
        variables = instance.variables.len(),
        functions = instance.functions.len(),
        iterations = config.iterations,
        "solving dcop"
    );
    let result = solver.solve(instance, config);
    debug!(assigned = result.len(), "dcop solved");
    result
}

/// Synchronous Max-Sum.
#[derive(Debug, Clone, Default)]
pub struct MaxSum {
    /// q(v→f), indexed `[variable][neighbour slot of v][domain index]`.
    q: Vec<Vec<Vec<f64>>>,
    /// r(f→v), indexed `[function][slot][domain index of the slot's variable]`.
    r: Vec<Vec<Vec<f64>>>,
}

impl MaxSum {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, instance: &DcopInstance) {
        self.q = instance
            .variables
            .iter()
            .map(|v| vec![vec![0.0; v.domain.len()]; v.neighbours.len()])
            .collect();
        self.r = instance
            .functions
            .iter()
            .map(|f| {
                f.neighbours
                    .iter()
                    .map(|&v| vec![0.0; instance.variable(v).domain.len()])
                    .collect()
            })
            .collect();
    }

    /// Position of function `f` in the neighbour list of variable `v`.
    fn q_slot(instance: &DcopInstance, v: usize, f: usize) -> Option<usize> {
        instance.variables[v]
            .neighbours
            .iter()
            .position(|g| g.0 == f)
    }

    fn update_function_messages(&mut self, instance: &DcopInstance) {
        for (fi, function) in instance.functions.iter().enumerate() {
            let k = function.neighbours.len();
            if k == 0 {
                continue;
            }
            debug_assert!(k <= MAX_FUNCTION_ARITY, "function {fi} has {k} neighbours");

            // Per slot: (q of the commit value, best q over non-committing values).
            let mut terms = Vec::with_capacity(k);
            for &v in &function.neighbours {
                let var = instance.variable(v);
                let q = Self::q_slot(instance, v.0, fi)
                    .map(|s| self.q[v.0][s].as_slice())
                    .unwrap_or(&[]);
                let mut commit = f64::NEG_INFINITY;
                let mut decline = f64::NEG_INFINITY;
                for (d, value) in var.domain.iter().enumerate() {
                    let m = q.get(d).copied().unwrap_or(0.0);
                    if value.commits_to(function.task) {
                        commit = commit.max(m);
                    } else {
                        decline = decline.max(m);
                    }
                }
                terms.push((commit, decline));
            }

            // best[slot][committing?]
            let mut best = vec![[f64::NEG_INFINITY; 2]; k];
            for (mask, utility) in function.utilities.iter() {
                let total: f64 = utility
                    + terms
                        .iter()
                        .enumerate()
                        .map(|(j, &(c, d))| if mask & (1 << j) != 0 { c } else { d })
                        .sum::<f64>();
                for (i, &(c, d)) in terms.iter().enumerate() {
                    let bit = usize::from(mask & (1 << i) != 0);
                    let own = if bit == 1 { c } else { d };
                    let value = total - own;
                    if value > best[i][bit] {
                        best[i][bit] = value;
                    }
                }
            }

            for (slot, &v) in function.neighbours.iter().enumerate() {
                let domain = &instance.variable(v).domain;
                let [declined, committed] = best[slot];
                self.r[fi][slot] = domain
                    .iter()
                    .map(|d| {
                        if d.commits_to(function.task) {
                            committed
                        } else {
                            declined
                        }
                    })
                    .collect();
            }
        }
    }

    fn update_variable_messages(&mut self, instance: &DcopInstance) {
        for (vi, variable) in instance.variables.iter().enumerate() {
            let incoming = self.incoming(instance, vi);
            let n = variable.domain.len();
            for (s, _) in variable.neighbours.iter().enumerate() {
                let mut msg = vec![0.0; n];
                for (t, r) in incoming.iter().enumerate() {
                    if t == s {
                        continue;
                    }
                    for (m, x) in msg.iter_mut().zip(r) {
                        *m += x;
                    }
                }
                let mean = if n == 0 { 0.0 } else { msg.iter().sum::<f64>() / n as f64 };
                for m in &mut msg {
                    *m -= mean;
                }
                self.q[vi][s] = msg;
            }
        }
    }

    /// r messages received by variable `vi`, in the order of its neighbours.
    fn incoming(&self, instance: &DcopInstance, vi: usize) -> Vec<Vec<f64>> {
        let variable = &instance.variables[vi];
        variable
            .neighbours
            .iter()
            .map(|&f| {
                instance
                    .function(f)
                    .neighbours
                    .iter()
                    .position(|v| v.0 == vi)
                    .map(|slot| self.r[f.0][slot].clone())
                    .unwrap_or_else(|| vec![0.0; variable.domain.len()])
            })
            .collect()
    }

    fn current_values(&self, instance: &DcopInstance) -> AssignmentResult {
        let mut out = AssignmentResult::new();
        for (vi, variable) in instance.variables.iter().enumerate() {
            let mut belief = vec![0.0; variable.domain.len()];
            for r in self.incoming(instance, vi) {
                for (b, x) in belief.iter_mut().zip(&r) {
                    *b += x;
                }
            }
            let mut chosen: Option<(usize, f64)> = None;
            for (d, &b) in belief.iter().enumerate() {
                if chosen.map_or(true, |(_, best)| b > best) {
                    chosen = Some((d, b));
                }
            }
            if let Some((d, _)) = chosen {
                out.insert(variable.worker, variable.domain[d]);
            }
        }
        out
    }
}

impl MaxSumSolver for MaxSum {
    fn solve(&mut self, instance: &DcopInstance, config: &SolverConfig) -> AssignmentResult {
        self.reset(instance);
        for iteration in 0..config.iterations {
            self.update_function_messages(instance);
            self.update_variable_messages(instance);
            if !config.update_only_at_end {
                let values = self.current_values(instance);
                trace!(iteration, values = ?values, "max-sum values");
            }
        }
        self.current_values(instance)
    }
}
