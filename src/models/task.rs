//! Task model.
//!
//! A task is a unit of work that exactly one robot (exclusive mode) or a
//! group of robots (collaborative mode) must visit and perform. Tasks are
//! related by precedence edges declared through `predecessors`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

/// Unique task identifier.
///
/// Zero is reserved as the "no assignment" sentinel of the signed
/// commit/decline encoding, so it is not representable here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(NonZeroU32);

impl TaskId {
    /// Creates a task id. Returns `None` for zero.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw numeric value (always positive).
    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl TryFrom<u32> for TaskId {
    type Error = String;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| "task id 0 is reserved".to_string())
    }
}

/// A point in the 2D workspace.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    pub fn distance(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A task to be allocated.
///
/// # Time Representation
/// Durations, deadlines and release times are seconds relative to the
/// allocation epoch (t=0), when every robot stands at its start location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Human-readable name.
    pub name: String,
    /// Scheduling priority (higher = more important).
    pub priority: i32,
    /// Where the task is performed.
    pub location: Location,
    /// Processing time once a robot is on site.
    pub duration: f64,
    /// Latest completion time. `None` = no deadline.
    pub deadline: Option<f64>,
    /// Earliest start time. `None` = available immediately.
    pub release_time: Option<f64>,
    /// Skills a robot needs to perform this task (heterogeneous fleets).
    pub required_skills: Vec<String>,
    /// Tasks that must finish before this one may start.
    pub predecessors: Vec<TaskId>,
    /// Domain-specific key-value metadata.
    pub attributes: HashMap<String, String>,
}

impl Task {
    /// Creates a unit-duration task at the origin.
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            name: String::new(),
            priority: 0,
            location: Location::default(),
            duration: 1.0,
            deadline: None,
            release_time: None,
            required_skills: Vec::new(),
            predecessors: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the task location.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.location = Location::new(x, y);
        self
    }

    /// Sets the processing duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the deadline (latest completion time).
    pub fn with_deadline(mut self, deadline: f64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the release time (earliest start time).
    pub fn with_release_time(mut self, release: f64) -> Self {
        self.release_time = Some(release);
        self
    }

    /// Adds a required skill.
    pub fn requires(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Adds a predecessor.
    pub fn after(mut self, predecessor: TaskId) -> Self {
        self.predecessors.push(predecessor);
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the task depends on nothing.
    pub fn is_root(&self) -> bool {
        self.predecessors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(raw: u32) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    #[test]
    fn test_task_id_rejects_zero() {
        assert!(TaskId::new(0).is_none());
        assert!(TaskId::try_from(0).is_err());
        assert_eq!(TaskId::try_from(5).unwrap().get(), 5);
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(tid(12).to_string(), "T12");
        assert_eq!(format!("{:?}", vec![tid(1), tid(2)]), "[T1, T2]");
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new(tid(3))
            .with_name("inspect valve")
            .with_priority(4)
            .at(10.0, 20.0)
            .with_duration(5.0)
            .with_deadline(100.0)
            .with_release_time(2.0)
            .requires("camera")
            .after(tid(1))
            .with_attribute("zone", "B");

        assert_eq!(task.id, tid(3));
        assert_eq!(task.name, "inspect valve");
        assert_eq!(task.priority, 4);
        assert_eq!(task.location, Location::new(10.0, 20.0));
        assert_eq!(task.duration, 5.0);
        assert_eq!(task.deadline, Some(100.0));
        assert_eq!(task.release_time, Some(2.0));
        assert_eq!(task.required_skills, vec!["camera".to_string()]);
        assert_eq!(task.predecessors, vec![tid(1)]);
        assert!(!task.is_root());
        assert_eq!(task.attributes.get("zone"), Some(&"B".to_string()));
    }

    #[test]
    fn test_location_distance() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_task_id_serde_transparent() {
        let json = serde_json::to_string(&tid(8)).unwrap();
        assert_eq!(json, "8");
        let back: TaskId = serde_json::from_str("8").unwrap();
        assert_eq!(back, tid(8));
        assert!(serde_json::from_str::<TaskId>("0").is_err());
    }
}
