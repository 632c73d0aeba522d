//! Reference shortest-path search.
//!
//! Keeps every frontier entry as `(distance, node, path so far)` and scans
//! for the minimum on each step. Quadratic, but each step is easy to check
//! by hand, which makes it the oracle the heap engine is tested against.

use std::collections::HashSet;

use super::{Path, WeightedGraph};

struct Frontier {
    distance: f64,
    node: String,
    path: Vec<String>,
}

/// Minimum-weight path from `start` to `end`, or `None` if not found.
pub fn shortest_path(graph: &WeightedGraph, start: &str, end: &str) -> Option<Path> {
    if !graph.contains(start) || !graph.contains(end) {
        return None;
    }

    let mut frontier = vec![Frontier {
        distance: 0.0,
        node: start.to_string(),
        path: vec![start.to_string()],
    }];
    let mut visited: HashSet<String> = HashSet::new();

    while let Some(index) = cheapest(&frontier) {
        let Frontier {
            distance,
            node,
            path,
        } = frontier.remove(index);

        if visited.contains(&node) {
            continue;
        }
        visited.insert(node.clone());

        if node == end {
            return Some(Path {
                nodes: path,
                distance,
            });
        }

        for edge in graph.neighbors(&node) {
            if visited.contains(&edge.to) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(edge.to.clone());
            frontier.push(Frontier {
                distance: distance + edge.weight,
                node: edge.to.clone(),
                path: next_path,
            });
        }
    }

    None
}

/// Index of the lowest-distance entry; the oldest entry wins ties.
fn cheapest(frontier: &[Frontier]) -> Option<usize> {
    frontier
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| a.distance.total_cmp(&b.distance).then(ia.cmp(ib)))
        .map(|(i, _)| i)
}
