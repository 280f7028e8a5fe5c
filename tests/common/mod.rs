#![allow(dead_code)]

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use u_mrta::models::{Location, Robot, Task, TaskId};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per test and only printed for failures (or with
/// `-- --nocapture`). Enable levels with e.g. `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

pub fn tid(raw: u32) -> TaskId {
    TaskId::new(raw).expect("task ids in tests are positive")
}

pub fn task(raw: u32, x: f64, y: f64) -> Task {
    Task::new(tid(raw)).at(x, y)
}

pub fn robot(id: u32, x: f64, y: f64) -> Robot {
    Robot::new(id, Location::new(x, y))
}

/// A small warehouse job:
///
/// ```text
/// 1 ─┐
///    ├─> 3 ─> 5
/// 2 ─┘        ^
/// 4 ──────────┘   6 (independent)
/// ```
pub fn warehouse_tasks() -> Vec<Task> {
    vec![
        task(1, 2.0, 0.0).with_duration(2.0),
        task(2, 0.0, 3.0).with_duration(1.0),
        task(3, 4.0, 4.0).after(tid(1)).after(tid(2)),
        task(4, 8.0, 1.0).with_duration(3.0),
        task(5, 6.0, 6.0).after(tid(3)).after(tid(4)),
        task(6, 1.0, 8.0).with_duration(0.5),
    ]
}

pub fn warehouse_fleet() -> Vec<Robot> {
    vec![robot(1, 0.0, 0.0), robot(2, 5.0, 5.0), robot(3, 9.0, 0.0)]
}
