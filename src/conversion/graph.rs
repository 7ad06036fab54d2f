//! Conversion graph module.
//!
//! Provides the `ConversionGraph` type, which represents positive damage
//! conversions as a directed graph (source type → target type). Used to
//! answer "which damage types end up as this type", so that modifiers to an
//! upstream type can also be applied to the converted portion.

use super::{ConversionMatrix, DamageType};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// A directed graph of damage conversions.
///
/// Edges go from the converted type to the type it becomes. The fixed
/// damage-type order makes the graph acyclic, but traversal still tracks
/// visited nodes.
///
/// # Examples
///
/// ```rust
/// use modcalc::conversion::{ConversionMatrix, DamageType};
/// use modcalc::conversion::graph::ConversionGraph;
///
/// let matrix = ConversionMatrix::from_entries(&[
///     (DamageType::Physical, DamageType::Lightning, 0.5),
///     (DamageType::Lightning, DamageType::Fire, 0.5),
/// ]);
/// let graph = ConversionGraph::from_matrix(&matrix);
/// assert_eq!(
///     graph.upstream_of(DamageType::Fire),
///     vec![DamageType::Physical, DamageType::Lightning]
/// );
/// ```
pub struct ConversionGraph {
    graph: DiGraph<DamageType, f64>,
    node_map: HashMap<DamageType, NodeIndex>,
}

impl ConversionGraph {
    /// Create a graph with a node for every damage type and no edges.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let node_map = DamageType::ALL
            .iter()
            .map(|&t| (t, graph.add_node(t)))
            .collect();
        Self { graph, node_map }
    }

    /// Build the graph of every positive conversion in `matrix`.
    pub fn from_matrix(matrix: &ConversionMatrix) -> Self {
        let mut graph = Self::new();
        for from in DamageType::ALL {
            for (to, pct) in matrix.targets(from) {
                graph.add_edge(from, to, pct);
            }
        }
        graph
    }

    /// Add a conversion edge. Non-positive percentages are ignored.
    pub fn add_edge(&mut self, from: DamageType, to: DamageType, pct: f64) {
        if pct <= 0.0 {
            return;
        }
        let from_idx = self.node_map[&from];
        let to_idx = self.node_map[&to];
        self.graph.add_edge(from_idx, to_idx, pct);
    }

    /// Whether any conversion edge leaves `from`.
    pub fn converts(&self, from: DamageType) -> bool {
        self.graph
            .neighbors_directed(self.node_map[&from], petgraph::Direction::Outgoing)
            .next()
            .is_some()
    }

    /// Every damage type that reaches `target` through one or more
    /// conversions, in damage-type order. `target` itself is excluded.
    pub fn upstream_of(&self, target: DamageType) -> Vec<DamageType> {
        let mut visited = HashSet::new();
        let mut stack = vec![self.node_map[&target]];
        let mut upstream = Vec::new();

        while let Some(node_idx) = stack.pop() {
            if !visited.insert(node_idx) {
                continue;
            }
            // Incoming edges come from the types converted into this one
            for neighbor_idx in self
                .graph
                .neighbors_directed(node_idx, petgraph::Direction::Incoming)
            {
                if !visited.contains(&neighbor_idx) {
                    upstream.push(self.graph[neighbor_idx]);
                    stack.push(neighbor_idx);
                }
            }
        }

        upstream.sort();
        upstream.dedup();
        upstream.retain(|&t| t != target);
        upstream
    }
}

impl Default for ConversionGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edges_no_upstream() {
        let graph = ConversionGraph::new();
        assert!(graph.upstream_of(DamageType::Fire).is_empty());
        assert!(!graph.converts(DamageType::Physical));
    }

    #[test]
    fn test_transitive_upstream() {
        let mut graph = ConversionGraph::new();
        graph.add_edge(DamageType::Physical, DamageType::Cold, 0.3);
        graph.add_edge(DamageType::Cold, DamageType::Fire, 1.0);
        graph.add_edge(DamageType::Lightning, DamageType::Chaos, 0.2);

        assert_eq!(
            graph.upstream_of(DamageType::Fire),
            vec![DamageType::Physical, DamageType::Cold]
        );
        assert_eq!(graph.upstream_of(DamageType::Chaos), vec![DamageType::Lightning]);
        assert!(graph.upstream_of(DamageType::Physical).is_empty());
    }

    #[test]
    fn test_cycle_is_tolerated() {
        // Never produced from a validated matrix; traversal must still end
        let mut graph = ConversionGraph::new();
        graph.add_edge(DamageType::Cold, DamageType::Fire, 0.5);
        graph.add_edge(DamageType::Fire, DamageType::Cold, 0.5);
        assert_eq!(graph.upstream_of(DamageType::Fire), vec![DamageType::Cold]);
    }

    #[test]
    fn test_zero_edges_ignored() {
        let mut graph = ConversionGraph::new();
        graph.add_edge(DamageType::Physical, DamageType::Fire, 0.0);
        assert!(graph.upstream_of(DamageType::Fire).is_empty());
    }
}
