//! Allocation quality metrics (KPIs).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest completion time over the fleet |
//! | Total Travel | Sum of every robot's travel time |
//! | Tasks Scheduled | Distinct tasks on any robot's timeline |
//! | Makespan by Robot | Completion time of each robot's last task |
//!
//! Across several runs, [`KpiSummary`] averages makespan and travel and sums
//! the scheduled task counts.
//!
//! # Reference
//! Gerkey & Matarić (2004), "A Formal Analysis and Taxonomy of Task
//! Allocation in Multi-Robot Systems", IJRR 23(9)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{AllocationError, Result};
use crate::models::{Schedule, WorkerId};
use crate::worker::Worker;

/// Performance indicators of one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationKpi {
    /// Latest completion time over all robots.
    pub makespan: f64,
    /// Sum of travel times.
    pub total_travel: f64,
    /// Number of distinct scheduled tasks.
    pub tasks_scheduled: usize,
    /// Per-robot makespan.
    pub makespan_by_worker: BTreeMap<WorkerId, f64>,
}

impl AllocationKpi {
    /// Computes KPIs from a fleet schedule.
    pub fn calculate(schedule: &Schedule) -> Self {
        Self {
            makespan: schedule.makespan(),
            total_travel: schedule.total_travel(),
            tasks_scheduled: schedule.scheduled_tasks().len(),
            makespan_by_worker: schedule.makespan_by_worker(),
        }
    }

    /// Computes KPIs straight from the robots.
    ///
    /// Unlike [`calculate`](Self::calculate) this trusts each robot's own
    /// makespan, which is infinite for an inconsistent timeline.
    pub fn from_workers<W: Worker>(workers: &[W]) -> Self {
        let mut makespan = 0.0_f64;
        let mut total_travel = 0.0;
        let mut tasks = BTreeSet::new();
        let mut makespan_by_worker = BTreeMap::new();

        for worker in workers {
            let ms = worker.makespan();
            makespan = makespan.max(ms);
            makespan_by_worker.insert(worker.id(), ms);
            for a in worker.all_current_tasks() {
                total_travel += a.travel;
                tasks.insert(a.task_id);
            }
        }

        Self {
            makespan,
            total_travel,
            tasks_scheduled: tasks.len(),
            makespan_by_worker,
        }
    }

    /// Fails with [`AllocationError::InfiniteMakespan`] if the makespan is
    /// not finite.
    pub fn ensure_finite(&self) -> Result<()> {
        if self.makespan.is_finite() {
            Ok(())
        } else {
            Err(AllocationError::InfiniteMakespan)
        }
    }
}

/// Aggregate over several allocation runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub runs: usize,
    pub avg_makespan: f64,
    pub avg_travel: f64,
    /// Sum of `tasks_scheduled` over all runs.
    pub total_tasks_scheduled: usize,
}

impl KpiSummary {
    /// Averages `runs`. An empty slice gives an all-zero summary.
    ///
    /// # Errors
    /// [`AllocationError::InfiniteMakespan`] if the average makespan is
    /// infinite.
    pub fn from_runs(runs: &[AllocationKpi]) -> Result<Self> {
        if runs.is_empty() {
            return Ok(Self::default());
        }
        let n = runs.len() as f64;
        let summary = Self {
            runs: runs.len(),
            avg_makespan: runs.iter().map(|k| k.makespan).sum::<f64>() / n,
            avg_travel: runs.iter().map(|k| k.total_travel).sum::<f64>() / n,
            total_tasks_scheduled: runs.iter().map(|k| k.tasks_scheduled).sum(),
        };
        if summary.avg_makespan.is_infinite() {
            return Err(AllocationError::InfiniteMakespan);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Location, Preconditions, Robot, Task, TaskId};

    fn tid(raw: u32) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new(tid(1), WorkerId(1), 2.0, 3.0).with_travel(2.0));
        s.add_assignment(Assignment::new(tid(2), WorkerId(2), 1.0, 5.0).with_travel(1.0));
        // Shared task.
        s.add_assignment(Assignment::new(tid(2), WorkerId(1), 4.0, 5.0).with_travel(1.0));
        s
    }

    #[test]
    fn test_kpi_basic() {
        let kpi = AllocationKpi::calculate(&sample_schedule());
        assert!((kpi.makespan - 5.0).abs() < 1e-10);
        assert!((kpi.total_travel - 4.0).abs() < 1e-10);
        assert_eq!(kpi.tasks_scheduled, 2);
        assert_eq!(kpi.makespan_by_worker[&WorkerId(1)], 5.0);
        assert!(kpi.ensure_finite().is_ok());
    }

    #[test]
    fn test_kpi_from_workers() {
        let mut robot = Robot::new(1, Location::default());
        let task = Task::new(tid(1)).at(3.0, 4.0);
        let pre = Preconditions::new();
        let quote = robot.min_cost_to_insert(&task, &pre);
        robot.commit(&task, quote.position, &pre);

        let kpi = AllocationKpi::from_workers(&[robot, Robot::new(2, Location::default())]);
        assert!((kpi.makespan - 6.0).abs() < 1e-10);
        assert!((kpi.total_travel - 5.0).abs() < 1e-10);
        assert_eq!(kpi.tasks_scheduled, 1);
        assert_eq!(kpi.makespan_by_worker[&WorkerId(2)], 0.0);
    }

    #[test]
    fn test_infinite_makespan() {
        let mut kpi = AllocationKpi::calculate(&sample_schedule());
        kpi.makespan = f64::INFINITY;
        assert!(matches!(kpi.ensure_finite(), Err(AllocationError::InfiniteMakespan)));
        assert!(matches!(
            KpiSummary::from_runs(&[kpi]),
            Err(AllocationError::InfiniteMakespan)
        ));
    }

    #[test]
    fn test_summary_averages() {
        let a = AllocationKpi::calculate(&sample_schedule());
        let mut b = a.clone();
        b.makespan = 7.0;
        b.total_travel = 2.0;

        let summary = KpiSummary::from_runs(&[a, b]).unwrap();
        assert_eq!(summary.runs, 2);
        assert!((summary.avg_makespan - 6.0).abs() < 1e-10);
        assert!((summary.avg_travel - 3.0).abs() < 1e-10);
        assert_eq!(summary.total_tasks_scheduled, 4);
        assert_eq!(KpiSummary::from_runs(&[]).unwrap(), KpiSummary::default());
    }

    #[test]
    fn test_kpi_serializes() {
        let kpi = AllocationKpi::calculate(&sample_schedule());
        let json = serde_json::to_string(&kpi).unwrap();
        assert!(json.contains("\"tasks_scheduled\":2"));
    }
}
