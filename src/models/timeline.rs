//! Per-robot temporal schedule.
//!
//! A timeline is the ordered list of tasks one robot performs. Times are not
//! stored; they are recomputed by simulating the robot driving from task to
//! task, so any candidate insertion can be evaluated without mutating the
//! committed sequence.
//!
//! # Timing rules
//! - The robot starts at its origin at t=0.
//! - Each task starts at `max(arrival, release_time, earliest_start)`.
//! - A sequence is infeasible if a task ends after its deadline or after its
//!   finish bound. Finish bounds are tightened after every commit, so a task
//!   that has been reported to the precedence graph never finishes later.

use super::{Assignment, Location, Task, WorkerId};

const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
struct Slot {
    task: Task,
    earliest_start: f64,
    finish_bound: Option<f64>,
}

/// Result of simulating a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Assignments in timeline order.
    pub assignments: Vec<Assignment>,
    /// End of the last task (0 if empty).
    pub makespan: f64,
    /// Sum of travel legs.
    pub travel: f64,
}

/// Ordered task sequence of one robot.
#[derive(Debug, Clone)]
pub struct Timeline {
    origin: Location,
    speed: f64,
    slots: Vec<Slot>,
}

impl Timeline {
    /// Creates an empty timeline for a robot starting at `origin`.
    pub fn new(origin: Location, speed: f64) -> Self {
        Self {
            origin,
            speed,
            slots: Vec::new(),
        }
    }

    /// Where the robot stands at t=0.
    pub fn origin(&self) -> Location {
        self.origin
    }

    /// Travel speed (distance per second).
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Number of tasks on the timeline.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Tasks in timeline order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.slots.iter().map(|s| &s.task)
    }

    /// Simulates the committed sequence.
    ///
    /// Returns `None` if it is infeasible, which cannot happen for a timeline
    /// only ever grown through feasible insertions.
    pub fn evaluate(&self, worker: WorkerId) -> Option<Evaluation> {
        self.simulate(worker, self.slots.iter().map(SlotView::from))
    }

    /// Simulates the sequence with `task` inserted before index `position`.
    pub fn evaluate_insertion(
        &self,
        worker: WorkerId,
        position: usize,
        task: &Task,
        earliest_start: f64,
    ) -> Option<Evaluation> {
        let position = position.min(self.slots.len());
        let candidate = SlotView {
            task,
            earliest_start,
            finish_bound: None,
        };
        let views = self.slots[..position]
            .iter()
            .map(SlotView::from)
            .chain(std::iter::once(candidate))
            .chain(self.slots[position..].iter().map(SlotView::from));
        self.simulate(worker, views)
    }

    /// Inserts `task` before index `position` (clamped to the end) and
    /// tightens every finish bound to the resulting finish times.
    pub fn insert(&mut self, worker: WorkerId, position: usize, task: Task, earliest_start: f64) {
        let position = position.min(self.slots.len());
        self.slots.insert(
            position,
            Slot {
                task,
                earliest_start,
                finish_bound: None,
            },
        );
        self.pin_finish_times(worker);
    }

    /// Fixes every slot's finish bound to its current finish time.
    pub fn pin_finish_times(&mut self, worker: WorkerId) {
        let Some(eval) = self.evaluate(worker) else {
            return;
        };
        for (slot, assignment) in self.slots.iter_mut().zip(eval.assignments.iter()) {
            slot.finish_bound = Some(assignment.end);
        }
    }

    fn simulate<'a>(
        &self,
        worker: WorkerId,
        views: impl Iterator<Item = SlotView<'a>>,
    ) -> Option<Evaluation> {
        let mut clock = 0.0_f64;
        let mut here = self.origin;
        let mut travel_total = 0.0;
        let mut assignments = Vec::new();

        for view in views {
            let task = view.task;
            let travel = here.distance(&task.location) / self.speed;
            let arrival = clock + travel;
            let start = arrival
                .max(view.earliest_start)
                .max(task.release_time.unwrap_or(0.0));
            let end = start + task.duration;

            if let Some(deadline) = task.deadline {
                if end > deadline + TIME_EPSILON {
                    return None;
                }
            }
            if let Some(bound) = view.finish_bound {
                if end > bound + TIME_EPSILON {
                    return None;
                }
            }

            assignments.push(Assignment::new(task.id, worker, start, end).with_travel(travel));
            travel_total += travel;
            clock = end;
            here = task.location;
        }

        Some(Evaluation {
            makespan: clock,
            travel: travel_total,
            assignments,
        })
    }
}

#[derive(Clone, Copy)]
struct SlotView<'a> {
    task: &'a Task,
    earliest_start: f64,
    finish_bound: Option<f64>,
}

impl<'a> From<&'a Slot> for SlotView<'a> {
    fn from(slot: &'a Slot) -> Self {
        Self {
            task: &slot.task,
            earliest_start: slot.earliest_start,
            finish_bound: slot.finish_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;

    const R: WorkerId = WorkerId(1);

    fn task(raw: u32, x: f64, duration: f64) -> Task {
        Task::new(TaskId::new(raw).unwrap())
            .at(x, 0.0)
            .with_duration(duration)
    }

    #[test]
    fn test_empty_timeline() {
        let tl = Timeline::new(Location::default(), 1.0);
        let eval = tl.evaluate(R).unwrap();
        assert!(eval.assignments.is_empty());
        assert_eq!(eval.makespan, 0.0);
        assert!(tl.is_empty());
    }

    #[test]
    fn test_travel_and_processing() {
        let mut tl = Timeline::new(Location::default(), 2.0);
        tl.insert(R, 0, task(1, 10.0, 3.0), 0.0);
        tl.insert(R, 1, task(2, 14.0, 1.0), 0.0);

        let eval = tl.evaluate(R).unwrap();
        // T1: travel 5, start 5, end 8; T2: travel 2, start 10, end 11
        assert_eq!(eval.assignments[0].start, 5.0);
        assert_eq!(eval.assignments[0].end, 8.0);
        assert_eq!(eval.assignments[1].start, 10.0);
        assert_eq!(eval.makespan, 11.0);
        assert_eq!(eval.travel, 7.0);
    }

    #[test]
    fn test_earliest_start_and_release_delay_start() {
        let mut tl = Timeline::new(Location::default(), 1.0);
        tl.insert(R, 0, task(1, 1.0, 1.0).with_release_time(4.0), 0.0);
        tl.insert(R, 1, task(2, 1.0, 1.0), 9.0);

        let eval = tl.evaluate(R).unwrap();
        assert_eq!(eval.assignments[0].start, 4.0);
        assert_eq!(eval.assignments[1].start, 9.0);
    }

    #[test]
    fn test_deadline_makes_insertion_infeasible() {
        let tl = Timeline::new(Location::default(), 1.0);
        let late = task(1, 10.0, 5.0).with_deadline(12.0);
        assert!(tl.evaluate_insertion(R, 0, &late, 0.0).is_none());

        let ok = task(2, 10.0, 5.0).with_deadline(15.0);
        assert!(tl.evaluate_insertion(R, 0, &ok, 0.0).is_some());
    }

    #[test]
    fn test_finish_bound_blocks_delaying_insertions() {
        let mut tl = Timeline::new(Location::default(), 1.0);
        tl.insert(R, 0, task(1, 2.0, 1.0), 0.0); // ends at 3, pinned

        // Putting anything in front delays T1 beyond its bound.
        let front = task(2, 1.0, 1.0);
        assert!(tl.evaluate_insertion(R, 0, &front, 0.0).is_none());
        // Appending is fine.
        assert!(tl.evaluate_insertion(R, 1, &front, 0.0).is_some());
    }

    #[test]
    fn test_insertion_into_idle_gap() {
        let mut tl = Timeline::new(Location::default(), 1.0);
        // T1 waits until t=20 before it can start.
        tl.insert(R, 0, task(1, 1.0, 1.0), 20.0);

        let filler = task(2, 1.0, 2.0);
        let eval = tl.evaluate_insertion(R, 0, &filler, 0.0).unwrap();
        assert_eq!(eval.assignments[0].task_id, TaskId::new(2).unwrap());
        assert_eq!(eval.assignments[1].end, 21.0);
    }

    #[test]
    fn test_position_is_clamped() {
        let mut tl = Timeline::new(Location::default(), 1.0);
        tl.insert(R, 42, task(1, 1.0, 1.0), 0.0);
        assert_eq!(tl.len(), 1);
        assert!(tl.evaluate_insertion(R, 99, &task(2, 2.0, 1.0), 0.0).is_some());
    }
}
