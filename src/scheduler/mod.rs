//! Allocation loop and KPI evaluation.
//!
//! # Algorithm
//!
//! `DcopAllocator` walks the precedence graph layer by layer. Each layer is
//! allocated in DCOP rounds: formulate a factor graph over the tasks still
//! open, solve it with Max-Sum, commit the winners, repeat. Finish times are
//! then reported back to the graph, which releases the next layer.
//!
//! # KPI
//!
//! `AllocationKpi` computes makespan, total travel and the number of
//! scheduled tasks; `KpiSummary` averages them over several runs.
//!
//! # References
//!
//! - Farinelli et al. (2008), "Decentralised coordination of low-power
//!   embedded devices using the max-sum algorithm"
//! - Nunes et al. (2017), "A taxonomy for task allocation problems with
//!   temporal and ordering constraints", RAS 90

mod allocator;
mod kpi;

pub use allocator::{Allocation, AllocationStats, DcopAllocator};
pub use kpi::{AllocationKpi, KpiSummary};
