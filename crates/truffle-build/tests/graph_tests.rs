//! Property tests for configuration inheritance
//!
//! Random DAGs are built so that configuration `i` only extends
//! configurations `j < i`, which keeps every generated graph acyclic.

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;
use truffle_build::{BuildError, ConfigurationGraph, Dependency, StaticResolver};

fn name(i: usize) -> String {
    format!("c{}", i)
}

/// Parent lists: entry `i` holds indices below `i`
fn dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..8).prop_flat_map(|n| {
        (0..n)
            .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3)))
            .collect::<Vec<_>>()
            .prop_map(|parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, ps)| ps.into_iter().filter(|p| *p < i).collect())
                    .collect()
            })
    })
}

fn build(parents: &[Vec<usize>]) -> ConfigurationGraph {
    let mut graph = ConfigurationGraph::new();
    for i in 0..parents.len() {
        graph.create_configuration(name(i), true, true).unwrap();
        graph
            .add_dependency(
                &name(i),
                Dependency::Files(vec![PathBuf::from(format!("/lib/{}.jar", i))]),
            )
            .unwrap();
    }
    for (i, ps) in parents.iter().enumerate() {
        for p in ps {
            graph.extend(&name(i), &name(*p)).unwrap();
        }
    }
    graph
}

fn members(graph: &ConfigurationGraph, i: usize) -> BTreeSet<String> {
    graph
        .effective_members(&name(i))
        .unwrap()
        .into_iter()
        .map(|d| d.to_string())
        .collect()
}

proptest! {
    #[test]
    fn effective_members_are_union_of_parents(parents in dag()) {
        let graph = build(&parents);
        for (i, ps) in parents.iter().enumerate() {
            let mut expected: BTreeSet<String> = graph
                .get(&name(i))
                .unwrap()
                .dependencies()
                .iter()
                .map(|d| d.to_string())
                .collect();
            for p in ps {
                expected.extend(members(&graph, *p));
            }
            prop_assert_eq!(members(&graph, i), expected);
        }
    }

    #[test]
    fn resolution_is_idempotent_and_duplicate_free(parents in dag()) {
        let mut graph = build(&parents);
        graph.close();
        let resolver = StaticResolver::new();
        for i in 0..parents.len() {
            let first = graph.resolve(&name(i), &resolver).unwrap();
            let second = graph.resolve(&name(i), &resolver).unwrap();
            prop_assert_eq!(&first, &second);
            let unique: BTreeSet<_> = first.iter().collect();
            prop_assert_eq!(unique.len(), first.len());
        }
    }

    #[test]
    fn back_edge_is_rejected_without_change(parents in dag()) {
        prop_assume!(parents.len() >= 2);
        let mut graph = build(&parents);
        let last = parents.len() - 1;
        // Make c0 reachable from the last configuration, then try the back edge
        graph.extend(&name(last), &name(0)).unwrap();
        let before = members(&graph, 0);

        let result = graph.extend(&name(0), &name(last));
        prop_assert!(matches!(result, Err(BuildError::Cycle { .. })), "expected a cycle error");
        prop_assert_eq!(members(&graph, 0), before);
        prop_assert!(graph.get(&name(0)).unwrap().extends_from().is_empty());
    }
}
