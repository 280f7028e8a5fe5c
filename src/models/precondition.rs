//! Precondition metadata propagated by the precedence graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::TaskId;

/// Timing constraint a task inherits from its finished predecessors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precondition {
    /// The task may not start before this time.
    pub earliest_start: f64,
}

impl Precondition {
    pub fn not_before(earliest_start: f64) -> Self {
        Self { earliest_start }
    }
}

/// Accumulated preconditions, keyed by the constrained task.
pub type Preconditions = HashMap<TaskId, Precondition>;

/// Earliest start allowed for `task`, or 0 if unconstrained.
pub fn earliest_start_of(preconditions: &Preconditions, task: TaskId) -> f64 {
    preconditions
        .get(&task)
        .map(|p| p.earliest_start)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earliest_start_lookup() {
        let t1 = TaskId::new(1).unwrap();
        let t2 = TaskId::new(2).unwrap();
        let mut pre = Preconditions::new();
        pre.insert(t1, Precondition::not_before(12.5));

        assert_eq!(earliest_start_of(&pre, t1), 12.5);
        assert_eq!(earliest_start_of(&pre, t2), 0.0);
    }
}
