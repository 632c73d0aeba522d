//! Binary-heap Dijkstra over a [`WeightedGraph`].

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::{Path, WeightedGraph};

/// Frontier entry. Ordering is reversed so the max-heap pops the cheapest node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct State<'g> {
    cost: f64,
    node: &'g str,
}

impl Eq for State<'_> {}

impl Ord for State<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for State<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Minimum-weight path from `start` to `end`.
///
/// Returns `None` when either node is absent or `end` is unreachable.
/// Stops as soon as `end` is finalized; edge weights are non-negative by
/// construction of [`WeightedGraph`].
pub fn shortest_path(graph: &WeightedGraph, start: &str, end: &str) -> Option<Path> {
    let start = graph.node_key(start)?;
    let end = graph.node_key(end)?;

    let mut best: HashMap<&str, f64> = HashMap::new();
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut finalized: HashSet<&str> = HashSet::new();
    let mut heap = BinaryHeap::new();

    best.insert(start, 0.0);
    heap.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        // Stale entry for a node already settled at a lower cost
        if !finalized.insert(node) {
            continue;
        }

        if node == end {
            return Some(Path {
                nodes: reconstruct_path(&parent, start, end),
                distance: cost,
            });
        }

        for edge in graph.neighbors(node) {
            let next = edge.to.as_str();
            if finalized.contains(next) {
                continue;
            }
            let next_cost = cost + edge.weight;
            let is_better = best.get(next).map_or(true, |&current| next_cost < current);
            if is_better {
                best.insert(next, next_cost);
                parent.insert(next, node);
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    None
}

fn reconstruct_path<'g>(
    parent: &HashMap<&'g str, &'g str>,
    start: &str,
    end: &'g str,
) -> Vec<String> {
    let mut nodes = vec![end.to_string()];
    let mut current = end;
    while current != start {
        match parent.get(current) {
            Some(&prev) => {
                nodes.push(prev.to_string());
                current = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    nodes
}
