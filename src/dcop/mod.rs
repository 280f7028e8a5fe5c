//! DCOP formulation and solving.
//!
//! Each allocation round is expressed as a factor graph: one variable per
//! robot that can fit at least one batch task, one function per batch task.
//!
//! | Module | Role |
//! |--------|------|
//! | [`FactorGraphBuilder`] | batch + fleet → [`DcopInstance`] and [`CostTable`] |
//! | [`joint_utility`] | commit/decline combination → utility |
//! | [`MaxSum`] | message-passing maximisation |
//! | [`resolve`] | solver values → schedule commits |
//!
//! # References
//!
//! - Farinelli et al. (2008), "Decentralised coordination of low-power
//!   embedded devices using the max-sum algorithm"
//! - Fioretto, Pontelli & Yeoh (2018), "Distributed Constraint Optimization
//!   Problems and Applications: A Survey", JAIR 61

mod builder;
mod cost_table;
mod factor_graph;
mod resolver;
mod solver;
mod utility;

pub use builder::{FactorGraphBuilder, Formulation};
pub use cost_table::{CostEntry, CostTable, MIN_INSERTION_COST};
pub use factor_graph::{
    Agent, AgentIdx, DcopInstance, Decision, Function, FunctionIdx, UtilityTable, Variable,
    VariableIdx, MAX_FUNCTION_ARITY,
};
pub use resolver::{collect_awards, resolve};
pub use solver::{run_solver, AssignmentResult, MaxSum, MaxSumSolver, SolverConfig};
pub use utility::{combined_cost, joint_utility, AssignmentMode, INFEASIBLE_UTILITY};
