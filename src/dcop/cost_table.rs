//! Per-round cost table.
//!
//! Maps task → robot → (inverted cost, insertion position). The table is
//! rebuilt from scratch for every DCOP round and passed by value through
//! builder, solver and resolver; positions are only valid against the robot
//! schedules the round was formulated on.

use std::collections::BTreeMap;

use crate::models::{TaskId, WorkerId};

/// Insertion costs below this are clamped before inversion.
pub const MIN_INSERTION_COST: f64 = 1e-9;

/// One (task, robot) quote.
#[derive(Debug, Clone, PartialEq)]
pub struct CostEntry<P> {
    /// Raw insertion cost (`+∞` if the task does not fit).
    pub cost: f64,
    /// `1 / cost`; `-∞` for infeasible insertions.
    pub utility: f64,
    /// Position to commit at.
    pub position: P,
}

impl<P> CostEntry<P> {
    pub fn new(cost: f64, position: P) -> Self {
        let utility = if cost.is_finite() {
            1.0 / cost.max(MIN_INSERTION_COST)
        } else {
            f64::NEG_INFINITY
        };
        Self {
            cost,
            utility,
            position,
        }
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }
}

/// Task → robot → [`CostEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable<P> {
    entries: BTreeMap<TaskId, BTreeMap<WorkerId, CostEntry<P>>>,
}

impl<P> Default for CostTable<P> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<P> CostTable<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a quote, replacing any previous one for the pair.
    pub fn insert(&mut self, task: TaskId, worker: WorkerId, entry: CostEntry<P>) {
        self.entries.entry(task).or_default().insert(worker, entry);
    }

    pub fn get(&self, task: TaskId, worker: WorkerId) -> Option<&CostEntry<P>> {
        self.entries.get(&task)?.get(&worker)
    }

    /// Inverted cost of a pair; `-∞` if unknown or infeasible.
    pub fn utility(&self, task: TaskId, worker: WorkerId) -> f64 {
        self.get(task, worker)
            .map(|e| e.utility)
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Quotes for one task, by robot.
    pub fn quotes_for(&self, task: TaskId) -> impl Iterator<Item = (WorkerId, &CostEntry<P>)> {
        self.entries
            .get(&task)
            .into_iter()
            .flat_map(|m| m.iter().map(|(w, e)| (*w, e)))
    }

    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of (task, robot) quotes.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(raw: u32) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    #[test]
    fn test_entry_inverts_cost() {
        let e = CostEntry::new(4.0, 2usize);
        assert!((e.utility - 0.25).abs() < 1e-10);
        assert!(e.is_feasible());
    }

    #[test]
    fn test_entry_infeasible() {
        let e = CostEntry::new(f64::INFINITY, 0usize);
        assert_eq!(e.utility, f64::NEG_INFINITY);
        assert!(!e.is_feasible());
    }

    #[test]
    fn test_zero_cost_is_clamped() {
        let e = CostEntry::new(0.0, 0usize);
        assert!(e.utility.is_finite());
        assert!((e.utility - 1.0 / MIN_INSERTION_COST).abs() < 1e-3);
    }

    #[test]
    fn test_table_lookup() {
        let mut table = CostTable::new();
        table.insert(tid(1), WorkerId(1), CostEntry::new(2.0, 0usize));
        table.insert(tid(1), WorkerId(2), CostEntry::new(4.0, 1usize));
        table.insert(tid(2), WorkerId(1), CostEntry::new(f64::INFINITY, 0usize));

        assert_eq!(table.len(), 3);
        assert!((table.utility(tid(1), WorkerId(1)) - 0.5).abs() < 1e-10);
        assert_eq!(table.get(tid(1), WorkerId(2)).map(|e| e.position), Some(1));
        assert_eq!(table.utility(tid(3), WorkerId(1)), f64::NEG_INFINITY);
        assert_eq!(table.quotes_for(tid(1)).count(), 2);
        assert_eq!(table.tasks().collect::<Vec<_>>(), vec![tid(1), tid(2)]);
    }
}
