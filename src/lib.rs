//! Multi-robot task allocation for the U-Engine ecosystem.
//!
//! Allocates precedence-constrained tasks to a fleet of mobile robots. Each
//! allocation step is framed as a Distributed Constraint Optimization Problem
//! (robots = variables, tasks = functions) and solved with Max-Sum message
//! passing; winners are committed into per-robot temporal schedules and the
//! precedence graph is advanced to the next layer.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Robot`, `Timeline`, `Schedule`,
//!   `Assignment`, `Precondition`
//! - **`worker`**: The cost-oracle interface robots implement
//! - **`precedence`**: Precedence graph interface and the `petgraph`-backed
//!   `LayeredGraph`
//! - **`dcop`**: Factor graph construction, utility model, Max-Sum, resolver
//! - **`scheduler`**: The layered allocation loop and KPIs
//! - **`validation`**: Input integrity checks and allocation checks
//! - **`config`**, **`errors`**, **`logging`**: Ambient plumbing
//!
//! # References
//!
//! - Farinelli et al. (2008), "Decentralised coordination of low-power
//!   embedded devices using the max-sum algorithm"
//! - Gerkey & Matarić (2004), "A Formal Analysis and Taxonomy of Task
//!   Allocation in Multi-Robot Systems"
//! - Nunes et al. (2017), "A taxonomy for task allocation problems with
//!   temporal and ordering constraints"

pub mod config;
pub mod dcop;
pub mod errors;
pub mod logging;
pub mod models;
pub mod precedence;
pub mod scheduler;
pub mod validation;
pub mod worker;

pub use config::AllocatorConfig;
pub use errors::{AllocationError, Result};
pub use scheduler::{Allocation, DcopAllocator};
