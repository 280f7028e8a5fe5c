//! Factor graph arena.
//!
//! Variables (one per candidate robot) and functions (one per batch task)
//! reference each other through plain indices into the instance's vectors,
//! so the bipartite graph has a single owner and no reference cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{TaskId, WorkerId};

/// Value of a variable: the robot either commits to a task or declines it.
///
/// Equivalent to the signed encoding `+id` / `-id` used by classic Max-Sum
/// implementations; see [`Decision::signed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decision {
    Commit(TaskId),
    Decline(TaskId),
}

impl Decision {
    /// The task this decision is about.
    pub fn task(self) -> TaskId {
        match self {
            Decision::Commit(t) | Decision::Decline(t) => t,
        }
    }

    pub fn is_commit(self) -> bool {
        matches!(self, Decision::Commit(_))
    }

    /// Whether this value commits the robot to `task`.
    #[inline]
    pub fn commits_to(self, task: TaskId) -> bool {
        self == Decision::Commit(task)
    }

    /// Signed encoding: `+id` for commit, `-id` for decline.
    pub fn signed(self) -> i64 {
        match self {
            Decision::Commit(t) => i64::from(t.get()),
            Decision::Decline(t) => -i64::from(t.get()),
        }
    }

    /// Decodes the signed encoding. Zero (no assignment) yields `None`.
    pub fn from_signed(value: i64) -> Option<Self> {
        let raw = u32::try_from(value.unsigned_abs()).ok()?;
        let task = TaskId::new(raw)?;
        Some(if value > 0 {
            Decision::Commit(task)
        } else {
            Decision::Decline(task)
        })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.signed())
    }
}

/// Index of a variable in [`DcopInstance::variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableIdx(pub usize);

/// Index of a function in [`DcopInstance::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionIdx(pub usize);

/// Index of an agent in [`DcopInstance::agents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentIdx(pub usize);

/// Decision variable of one robot.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub worker: WorkerId,
    /// Commit values first, then the matching decline values.
    pub domain: Vec<Decision>,
    pub neighbours: Vec<FunctionIdx>,
}

/// Largest number of slots a [`UtilityTable`] enumerates (`2^24` entries).
pub const MAX_FUNCTION_ARITY: usize = 24;

/// Joint-utility table of one task.
///
/// Entry `mask` holds the utility of the joint choice in which slot `i`
/// (the function's `i`-th neighbour) commits iff bit `i` of `mask` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtilityTable {
    arity: usize,
    values: Vec<f64>,
}

impl UtilityTable {
    /// Tabulates `utility(mask)` for every mask over `arity` slots.
    ///
    /// `arity` must not exceed [`MAX_FUNCTION_ARITY`]; the builder rejects
    /// larger functions before tabulating.
    pub fn tabulate(arity: usize, utility: impl FnMut(usize) -> f64) -> Self {
        debug_assert!(arity <= MAX_FUNCTION_ARITY, "utility table arity {arity} too large");
        let values = (0..1usize << arity).map(utility).collect();
        Self { arity, values }
    }

    /// Number of slots.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Utility of a joint choice.
    pub fn get(&self, mask: usize) -> Option<f64> {
        self.values.get(mask).copied()
    }

    /// `(mask, utility)` pairs in mask order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values.iter().copied().enumerate()
    }
}

/// Utility function of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub task: TaskId,
    /// Slots of the utility table, in order.
    pub neighbours: Vec<VariableIdx>,
    pub utilities: UtilityTable,
}

impl Function {
    /// Slot of `variable` in this function's table.
    pub fn slot_of(&self, variable: VariableIdx) -> Option<usize> {
        self.neighbours.iter().position(|&v| v == variable)
    }
}

/// A robot acting as a DCOP agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub worker: WorkerId,
    pub variables: Vec<VariableIdx>,
    pub functions: Vec<FunctionIdx>,
}

/// One DCOP round: variables, functions and the agents owning them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DcopInstance {
    pub variables: Vec<Variable>,
    pub functions: Vec<Function>,
    pub agents: Vec<Agent>,
}

impl DcopInstance {
    pub fn variable(&self, idx: VariableIdx) -> &Variable {
        &self.variables[idx.0]
    }

    pub fn function(&self, idx: FunctionIdx) -> &Function {
        &self.functions[idx.0]
    }

    pub fn agent(&self, idx: AgentIdx) -> &Agent {
        &self.agents[idx.0]
    }

    /// Function of a task, if the task is in this round.
    pub fn function_for(&self, task: TaskId) -> Option<FunctionIdx> {
        self.functions
            .iter()
            .position(|f| f.task == task)
            .map(FunctionIdx)
    }

    /// Variable of a robot, if the robot takes part in this round.
    pub fn variable_for(&self, worker: WorkerId) -> Option<VariableIdx> {
        self.variables
            .iter()
            .position(|v| v.worker == worker)
            .map(VariableIdx)
    }

    /// Robots linked to the function of `task`.
    pub fn neighbours_of(&self, task: TaskId) -> Vec<WorkerId> {
        self.function_for(task)
            .map(|f| {
                self.function(f)
                    .neighbours
                    .iter()
                    .map(|&v| self.variable(v).worker)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(raw: u32) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    #[test]
    fn test_signed_encoding() {
        assert_eq!(Decision::Commit(tid(5)).signed(), 5);
        assert_eq!(Decision::Decline(tid(5)).signed(), -5);
        assert_eq!(Decision::from_signed(7), Some(Decision::Commit(tid(7))));
        assert_eq!(Decision::from_signed(-7), Some(Decision::Decline(tid(7))));
        assert_eq!(Decision::from_signed(0), None);
        assert_eq!(Decision::from_signed(i64::MAX), None);
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(Decision::Commit(tid(3)).to_string(), "+3");
        assert_eq!(Decision::Decline(tid(3)).to_string(), "-3");
    }

    #[test]
    fn test_commits_to() {
        let d = Decision::Commit(tid(2));
        assert!(d.commits_to(tid(2)));
        assert!(!d.commits_to(tid(3)));
        assert!(!Decision::Decline(tid(2)).commits_to(tid(2)));
        assert_eq!(Decision::Decline(tid(2)).task(), tid(2));
    }

    #[test]
    fn test_utility_table_masks() {
        let table = UtilityTable::tabulate(2, |mask| mask as f64);
        assert_eq!(table.arity(), 2);
        assert_eq!(table.iter().count(), 4);
        assert_eq!(table.get(0b11), Some(3.0));
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn test_instance_lookups() {
        let instance = DcopInstance {
            variables: vec![Variable {
                worker: WorkerId(4),
                domain: vec![Decision::Commit(tid(1)), Decision::Decline(tid(1))],
                neighbours: vec![FunctionIdx(0)],
            }],
            functions: vec![Function {
                task: tid(1),
                neighbours: vec![VariableIdx(0)],
                utilities: UtilityTable::tabulate(1, |m| m as f64),
            }],
            agents: vec![],
        };
        assert_eq!(instance.variable_for(WorkerId(4)), Some(VariableIdx(0)));
        assert_eq!(instance.function_for(tid(1)), Some(FunctionIdx(0)));
        assert_eq!(instance.function_for(tid(2)), None);
        assert_eq!(instance.neighbours_of(tid(1)), vec![WorkerId(4)]);
        assert_eq!(instance.function(FunctionIdx(0)).slot_of(VariableIdx(0)), Some(0));
    }
}
