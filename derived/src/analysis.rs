//! Dependency analysis over a sentence set
//!
//! Used by the validator to reject cyclic definitions before any document is
//! seen, and by callers that want to show the order sentences resolve in.

use crate::error::{DeriveError, DeriveResult};
use crate::semantic::SentenceSet;
use std::collections::{BTreeSet, HashMap};

/// Attribute dependencies of every sentence, by name
///
/// # Examples
/// ```text
/// Given sentences:
///   _count   = source parse_len "$.items[*]"
///   has_many = _count > 1
///
/// Returns:
///   {"_count": [], "has_many": ["_count"]}
/// ```
pub fn build_dependency_graph(sentences: &SentenceSet) -> HashMap<String, Vec<String>> {
    sentences
        .iter()
        .map(|sentence| {
            let mut dependencies: Vec<String> = Vec::new();
            for name in sentence.dependencies() {
                if !dependencies.iter().any(|d| d == name) {
                    dependencies.push(name.to_string());
                }
            }
            (sentence.name.clone(), dependencies)
        })
        .collect()
}

/// Dependencies as declaration positions, skipping unknown names
fn positional_graph(sentences: &SentenceSet) -> Vec<Vec<usize>> {
    sentences
        .iter()
        .map(|sentence| {
            let mut dependencies: Vec<usize> = sentence
                .dependencies()
                .filter_map(|name| sentences.position(name))
                .collect();
            dependencies.dedup();
            dependencies
        })
        .collect()
}

/// First dependency cycle found, walking sentences in declaration order
///
/// The cycle starts and ends with the same name, e.g. `["a", "b", "a"]`.
pub fn find_cycle(sentences: &SentenceSet) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Visited,
    }

    let graph = positional_graph(sentences);
    let mut marks = vec![Mark::Unvisited; graph.len()];

    for start in 0..graph.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, index of the next dependency to explore)
        let mut path: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::Visiting;

        while let Some((node, next)) = path.last_mut() {
            let node = *node;
            let Some(&dependency) = graph[node].get(*next) else {
                marks[node] = Mark::Visited;
                path.pop();
                continue;
            };
            *next += 1;
            match marks[dependency] {
                Mark::Visiting => {
                    let cycle_start = path.iter().position(|(n, _)| *n == dependency).unwrap_or(0);
                    let mut cycle: Vec<String> = path[cycle_start..]
                        .iter()
                        .map(|(n, _)| sentences.at(*n).name.clone())
                        .collect();
                    cycle.push(sentences.at(dependency).name.clone());
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    marks[dependency] = Mark::Visiting;
                    path.push((dependency, 0));
                }
                Mark::Visited => {}
            }
        }
    }
    None
}

/// Names in an order where every sentence follows its dependencies
///
/// Ties are broken by declaration order, so the result is deterministic.
pub fn evaluation_order(sentences: &SentenceSet) -> DeriveResult<Vec<&str>> {
    let graph = positional_graph(sentences);
    let mut remaining: Vec<usize> = graph.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); graph.len()];
    for (node, dependencies) in graph.iter().enumerate() {
        for &dependency in dependencies {
            dependents[dependency].push(node);
        }
    }

    let mut ready: BTreeSet<usize> = (0..graph.len()).filter(|&n| remaining[n] == 0).collect();
    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = ready.pop_first() {
        order.push(sentences.at(node).name.as_str());
        for &dependent in &dependents[node] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < graph.len() {
        let cycle = find_cycle(sentences).unwrap_or_default();
        return Err(DeriveError::CyclicDependency {
            sentence: cycle.first().cloned().unwrap_or_default(),
            cycle,
        });
    }
    Ok(order)
}
