mod common;

use proptest::prelude::*;
use std::collections::BTreeSet;

use u_mrta::dcop::AssignmentMode;
use u_mrta::models::{Location, Robot, Task};
use u_mrta::precedence::{LayeredGraph, PrecedenceGraph};
use u_mrta::validation::validate_allocation;
use u_mrta::{AllocatorConfig, DcopAllocator};

use common::{init_tracing, tid};

// Strategy to generate a task DAG.
// Acyclicity: task i may only depend on tasks 1..i.
fn tasks_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Task>> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(
            (
                0.0..20.0f64,
                0.0..20.0f64,
                0.5..3.0f64,
                0..5i32,
                proptest::collection::vec(any::<usize>(), 0..3),
                any::<bool>(),
            ),
            n,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (x, y, duration, priority, deps, needs_arm))| {
                    let id = i as u32 + 1;
                    let mut task = Task::new(tid(id))
                        .at(x, y)
                        .with_duration(duration)
                        .with_priority(priority);
                    let preds: BTreeSet<u32> = deps
                        .into_iter()
                        .filter(|_| i > 0)
                        .map(|d| (d % i) as u32 + 1)
                        .collect();
                    for p in preds {
                        task = task.after(tid(p));
                    }
                    if needs_arm {
                        task = task.requires("arm");
                    }
                    task
                })
                .collect()
        })
    })
}

// Robot 1 always carries the arm so every task has a capable robot.
fn fleet_strategy(max_robots: usize) -> impl Strategy<Value = Vec<Robot>> {
    proptest::collection::vec((0.0..20.0f64, 0.0..20.0f64, any::<bool>()), 1..=max_robots).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (x, y, arm))| {
                    let robot = Robot::new(i as u32 + 1, Location::new(x, y));
                    if i == 0 || arm {
                        robot.with_skill("arm")
                    } else {
                        robot
                    }
                })
                .collect()
        },
    )
}

fn mode_strategy() -> impl Strategy<Value = AssignmentMode> {
    prop_oneof![
        Just(AssignmentMode::Exclusive),
        Just(AssignmentMode::Collaborative)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_every_task_is_scheduled_consistently(
        tasks in tasks_strategy(8),
        mut robots in fleet_strategy(4),
        mode in mode_strategy(),
        use_priority in any::<bool>(),
        heterogeneous in any::<bool>(),
        seed in any::<u64>(),
    ) {
        init_tracing();
        let config = AllocatorConfig::default()
            .with_mode(mode)
            .with_priority(use_priority)
            .with_heterogeneous(heterogeneous)
            .with_seed(seed);

        let mut graph = LayeredGraph::new(tasks.clone()).unwrap();
        let allocation = DcopAllocator::new(config)
            .allocate(&mut graph, &mut robots)
            .unwrap();

        prop_assert_eq!(graph.scheduled_count(), tasks.len());
        prop_assert_eq!(allocation.schedule.scheduled_tasks().len(), tasks.len());

        let violations = validate_allocation(&tasks, &allocation.schedule, mode);
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);

        if mode == AssignmentMode::Exclusive {
            prop_assert_eq!(allocation.schedule.assignment_count(), tasks.len());
        }

        if heterogeneous {
            for task in &tasks {
                for owner in allocation.schedule.owners_of(task.id) {
                    let robot = robots.iter().find(|r| r.id == owner).unwrap();
                    prop_assert!(task.required_skills.iter().all(|s| robot.has_skill(s)));
                }
            }
        }
    }

    #[test]
    fn test_allocation_is_deterministic(
        tasks in tasks_strategy(6),
        robots in fleet_strategy(3),
        seed in any::<u64>(),
    ) {
        let run = |mut fleet: Vec<Robot>| {
            let mut graph = LayeredGraph::new(tasks.clone()).unwrap();
            DcopAllocator::new(AllocatorConfig::default().with_seed(seed))
                .allocate(&mut graph, &mut fleet)
                .unwrap()
                .schedule
                .assignments
        };
        prop_assert_eq!(run(robots.clone()), run(robots));
    }
}
