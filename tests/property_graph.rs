// tests/property_graph.rs
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use proptest::prelude::*;

use dagrun::dag::{Scheduler, SchedulerOptions, TaskGraph};
use dagrun::errors::DagError;
use dagrun_test_utils::{FakeExecutor, TaskGraphBuilder};

// Acyclic by construction: task i may only depend on tasks 0..i.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n).prop_map(
            |raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        let deps: BTreeSet<usize> =
                            picks.into_iter().filter(|_| i > 0).map(|p| p % i.max(1)).collect();
                        deps.into_iter().collect()
                    })
                    .collect()
            },
        )
    })
}

// Arbitrary edges, self-loops included.
fn any_graph_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(0..n, 0..3), n)
    })
}

fn name(i: usize) -> String {
    format!("task_{i:02}")
}

fn build(deps: &[Vec<usize>]) -> TaskGraph {
    let mut builder = TaskGraphBuilder::new();
    for (i, ds) in deps.iter().enumerate() {
        let ds: Vec<String> = ds.iter().map(|d| name(*d)).collect();
        let ds: Vec<&str> = ds.iter().map(String::as_str).collect();
        builder = builder.task(&name(i), &ds);
    }
    builder.build()
}

fn petgraph_has_cycle(deps: &[Vec<usize>]) -> bool {
    let mut g = DiGraph::<(), ()>::new();
    let nodes: Vec<_> = (0..deps.len()).map(|_| g.add_node(())).collect();
    for (i, ds) in deps.iter().enumerate() {
        for d in ds {
            g.add_edge(nodes[*d], nodes[i], ());
        }
    }
    is_cyclic_directed(&g)
}

proptest! {
    #[test]
    fn acyclic_graphs_validate_and_plan_in_dependency_order(deps in dag_strategy(25)) {
        let graph = build(&deps);
        prop_assert!(graph.validate().is_ok());

        let scheduler = Scheduler::new(&graph, graph.reporter().clone(), SchedulerOptions { jobs: 4 });
        let plan = scheduler.plan().unwrap();

        prop_assert_eq!(plan.steps().count(), deps.len());
        for (i, ds) in deps.iter().enumerate() {
            let at = plan.batch_of(&name(i)).unwrap();
            for d in ds {
                prop_assert!(plan.batch_of(&name(*d)).unwrap() < at);
            }
        }
    }

    #[test]
    fn validation_agrees_with_petgraph(deps in any_graph_strategy(12)) {
        let graph = build(&deps);
        let result = graph.validate();

        if petgraph_has_cycle(&deps) {
            prop_assert!(matches!(result, Err(DagError::CycleDetected(_))), "{:?}", result);
        } else {
            prop_assert!(result.is_ok(), "{:?}", result);
        }
    }

    #[test]
    fn plan_mode_reaches_every_task_iff_acyclic(deps in any_graph_strategy(12)) {
        let graph = build(&deps);
        let scheduler = Scheduler::new(&graph, graph.reporter().clone(), SchedulerOptions { jobs: 2 });

        match scheduler.plan() {
            Ok(plan) => {
                prop_assert!(!petgraph_has_cycle(&deps));
                prop_assert_eq!(plan.steps().count(), deps.len());
            }
            Err(DagError::Deadlock { remaining }) => {
                prop_assert!(petgraph_has_cycle(&deps));
                prop_assert!(!remaining.is_empty());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn execute_mode_runs_every_task_after_its_dependencies(
        deps in dag_strategy(15),
        jobs in 1usize..5,
    ) {
        let graph = build(&deps);
        let executor = Arc::new(FakeExecutor::new());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let report = runtime.block_on(async {
            let mut scheduler = Scheduler::new(&graph, graph.reporter().clone(), SchedulerOptions { jobs });
            scheduler.execute(executor.clone()).await
        }).unwrap();

        prop_assert_eq!(report.completed.len(), deps.len());
        prop_assert!(executor.max_in_flight() <= jobs);

        let finished: HashMap<String, usize> = executor
            .events()
            .iter()
            .enumerate()
            .filter_map(|(at, e)| match e {
                dagrun_test_utils::ExecEvent::Finished(c, _) => Some((c.clone(), at)),
                _ => None,
            })
            .collect();
        for (i, ds) in deps.iter().enumerate() {
            let started = executor.start_index(&name(i)).unwrap();
            for d in ds {
                prop_assert!(finished[&name(*d)] < started);
            }
        }
    }
}
