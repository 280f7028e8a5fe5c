//! Robot model.
//!
//! Robots are the mobile workers tasks are allocated to. Each robot has a
//! start location, a travel speed, a skill set used for heterogeneous
//! capability filtering, and a timeline of committed tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

use tracing::trace;

use super::{earliest_start_of, Assignment, Location, Preconditions, Task, Timeline};
use crate::worker::{Insertion, Worker};

/// Unique robot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

const MIN_SPEED: f64 = 1e-6;

/// A mobile robot with a temporal schedule.
///
/// # Insertion cost
/// `alpha * makespan + (1 - alpha) * total_travel` of the timeline after
/// insertion. `alpha = 1` optimises pure makespan, `alpha = 0` pure travel.
#[derive(Debug, Clone)]
pub struct Robot {
    /// Unique robot identifier.
    pub id: WorkerId,
    /// Human-readable name.
    pub name: String,
    /// Skills for capability filtering.
    pub skills: Vec<String>,
    /// Makespan weight of the insertion cost (0.0 to 1.0).
    pub alpha: f64,
    timeline: Timeline,
}

impl Robot {
    /// Creates a unit-speed robot at `start`.
    pub fn new(id: u32, start: Location) -> Self {
        Self {
            id: WorkerId(id),
            name: String::new(),
            skills: Vec::new(),
            alpha: 1.0,
            timeline: Timeline::new(start, 1.0),
        }
    }

    /// Sets the robot name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the travel speed. Only valid before any task is committed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        let origin = self.start();
        self.timeline = Timeline::new(origin, speed.max(MIN_SPEED));
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Sets the makespan/travel trade-off.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.set_alpha(alpha);
        self
    }

    /// Sets the makespan/travel trade-off, clamped to `[0, 1]`.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Whether this robot has a given skill.
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s == name)
    }

    /// Start location.
    pub fn start(&self) -> Location {
        self.timeline.origin()
    }

    /// The committed timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Number of committed tasks.
    pub fn task_count(&self) -> usize {
        self.timeline.len()
    }

    /// Total travel time of the committed timeline.
    pub fn total_travel(&self) -> f64 {
        self.timeline
            .evaluate(self.id)
            .map(|e| e.travel)
            .unwrap_or(f64::INFINITY)
    }

    fn cost_of(&self, makespan: f64, travel: f64) -> f64 {
        self.alpha * makespan + (1.0 - self.alpha) * travel
    }
}

impl Worker for Robot {
    type Position = usize;

    fn id(&self) -> WorkerId {
        self.id
    }

    fn is_capable(&self, task: &Task) -> bool {
        task.required_skills.iter().all(|s| self.has_skill(s))
    }

    fn min_cost_to_insert(&self, task: &Task, preconditions: &Preconditions) -> Insertion<usize> {
        let earliest = earliest_start_of(preconditions, task.id);
        let mut best = Insertion::infeasible(self.timeline.len());

        for position in 0..=self.timeline.len() {
            let Some(eval) = self
                .timeline
                .evaluate_insertion(self.id, position, task, earliest)
            else {
                continue;
            };
            let cost = self.cost_of(eval.makespan, eval.travel);
            if cost < best.cost {
                best = Insertion { cost, position };
            }
        }

        trace!(robot = %self.id, task = %task.id, cost = best.cost, position = best.position, "insertion quote");
        best
    }

    fn commit(&mut self, task: &Task, position: usize, preconditions: &Preconditions) {
        let earliest = earliest_start_of(preconditions, task.id);
        self.timeline.insert(self.id, position, task.clone(), earliest);
    }

    fn all_current_tasks(&self) -> Vec<Assignment> {
        self.timeline
            .evaluate(self.id)
            .map(|e| e.assignments)
            .unwrap_or_default()
    }

    fn makespan(&self) -> f64 {
        self.timeline
            .evaluate(self.id)
            .map(|e| e.makespan)
            .unwrap_or(f64::INFINITY)
    }

    fn tighten_schedule(&mut self) -> Vec<Assignment> {
        self.timeline.pin_finish_times(self.id);
        self.all_current_tasks()
    }
}
