//! Joint-assignment utility model.
//!
//! Converts the inverted costs of the robots committing to a task into the
//! utility of that joint choice.
//!
//! | Mode | committing robots `m` | utility |
//! |------|-----------------------|---------|
//! | exclusive | 1 | the committer's inverted cost |
//! | exclusive | 0 or ≥ 2 | [`INFEASIBLE_UTILITY`] |
//! | collaborative | ≥ 1 | `ln(mean(inverted costs))` |
//! | collaborative | 0 | [`INFEASIBLE_UTILITY`] |
//!
//! The logarithm keeps the additive Max-Sum objective comparable across tasks
//! whose costs differ by orders of magnitude.

use serde::{Deserialize, Serialize};

/// Utility of a joint choice nobody may pick.
pub const INFEASIBLE_UTILITY: f64 = -10_000_000.0;

/// How many robots may perform one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// Exactly one robot per task.
    #[default]
    Exclusive,
    /// One or more robots share a task.
    Collaborative,
}

/// Mean of the participants' values.
pub fn combined_cost(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Utility of a joint choice, given the cost-table values of the committing
/// robots.
pub fn joint_utility(mode: AssignmentMode, committed: &[f64]) -> f64 {
    match (mode, committed.len()) {
        (AssignmentMode::Exclusive, 1) => committed[0],
        (AssignmentMode::Collaborative, m) if m >= 1 => combined_cost(committed).ln(),
        _ => INFEASIBLE_UTILITY,
    }
}
