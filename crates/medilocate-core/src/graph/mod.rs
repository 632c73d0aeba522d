//! Weighted location graph and shortest-path search.
//!
//! - [`builder`]: complete graph over located pharmacies plus an origin node
//! - [`dijkstra`]: binary-heap Dijkstra, the production engine
//! - [`reference`]: path-carrying frontier scan used to cross-check the heap engine

pub mod builder;
pub mod dijkstra;
pub mod reference;

pub use builder::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Graph construction and lookup errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Invalid edge weight {weight} from {from} to {to}")]
    InvalidWeight { from: String, to: String, weight: f64 },

    #[error("Invalid coordinate for {id}: ({latitude}, {longitude})")]
    InvalidCoordinate {
        id: String,
        latitude: f64,
        longitude: f64,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Directed edge to a neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub to: String,
    pub weight: f64,
}

/// Adjacency list keyed by node id.
///
/// Every edge target is itself a key, so the node set is closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedGraph {
    adjacency: BTreeMap<String, Vec<Edge>>,
}

impl WeightedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no edges.
    pub fn add_node(&mut self, id: impl Into<String>) -> GraphResult<()> {
        let id = id.into();
        if self.adjacency.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.adjacency.insert(id, Vec::new());
        Ok(())
    }

    /// Add a directed edge between two existing nodes.
    ///
    /// Weights must be finite and non-negative.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) -> GraphResult<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight {
                from: from.to_string(),
                to: to.to_string(),
                weight,
            });
        }
        if !self.adjacency.contains_key(to) {
            return Err(GraphError::NodeNotFound(to.to_string()));
        }
        let edges = self
            .adjacency
            .get_mut(from)
            .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?;
        edges.push(Edge {
            to: to.to_string(),
            weight,
        });
        Ok(())
    }

    /// Remove a node and every edge pointing at it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if self.adjacency.remove(id).is_none() {
            return false;
        }
        for edges in self.adjacency.values_mut() {
            edges.retain(|e| e.to != id);
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    /// The graph-owned key for `id`, so searches can borrow ids from the graph.
    pub(crate) fn node_key(&self, id: &str) -> Option<&str> {
        self.adjacency.get_key_value(id).map(|(k, _)| k.as_str())
    }

    /// Outgoing edges of `id` (empty if the node is absent).
    pub fn neighbors(&self, id: &str) -> &[Edge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Weight of the direct edge `from → to`, if any.
    pub fn edge_weight(&self, from: &str, to: &str) -> Option<f64> {
        self.neighbors(from)
            .iter()
            .find(|e| e.to == to)
            .map(|e| e.weight)
    }
}

/// A found path with its cumulative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// First element is the start, last is the end
    pub nodes: Vec<String>,
    pub distance: f64,
}

impl Path {
    pub fn start(&self) -> Option<&str> {
        self.nodes.first().map(String::as_str)
    }

    pub fn end(&self) -> Option<&str> {
        self.nodes.last().map(String::as_str)
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Which shortest-path engine answers queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathAlgorithm {
    /// O((V+E) log V) binary-heap Dijkstra
    #[default]
    BinaryHeap,
    /// Frontier scan carrying full paths; slow but easy to audit
    Reference,
}

impl PathAlgorithm {
    /// Shortest path from `start` to `end`, or `None` if either node is
    /// absent or `end` is unreachable.
    pub fn shortest_path(self, graph: &WeightedGraph, start: &str, end: &str) -> Option<Path> {
        match self {
            PathAlgorithm::BinaryHeap => dijkstra::shortest_path(graph, start, end),
            PathAlgorithm::Reference => reference::shortest_path(graph, start, end),
        }
    }

    /// Like [`shortest_path`](Self::shortest_path) but reports absent nodes as errors.
    pub fn try_shortest_path(
        self,
        graph: &WeightedGraph,
        start: &str,
        end: &str,
    ) -> GraphResult<Option<Path>> {
        for id in [start, end] {
            if !graph.contains(id) {
                return Err(GraphError::NodeNotFound(id.to_string()));
            }
        }
        Ok(self.shortest_path(graph, start, end))
    }
}

impl std::str::FromStr for PathAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binary_heap" | "heap" => Ok(PathAlgorithm::BinaryHeap),
            "reference" => Ok(PathAlgorithm::Reference),
            other => Err(format!("unknown path algorithm '{}'", other)),
        }
    }
}
