//! Shortest augmenting path search
//!
//! Breadth-first search over arcs with strictly positive residual capacity.
//! The first time the sink is discovered the search stops: BFS discovery
//! order guarantees the path found uses the fewest arcs, which is what bounds
//! Edmonds-Karp to O(V·E) augmentations.
//!
//! # Tie-break
//! Neighbours are expanded in ascending label order (the residual graph keeps
//! adjacency sorted by head) and the frontier is FIFO. Among several shortest
//! paths the one discovered first under that order is returned, so identical
//! input always yields identical paths.

use std::collections::VecDeque;

use crate::algorithm::graph::residual::{ArcId, ResidualGraph};
use crate::algorithm::traits::NodeId;

/// Per-node search marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Not reached by the current search
    Unvisited,
    /// The search root; visited, but has no predecessor
    Root,
    /// Reached from `predecessor` through `arc`
    Reached { predecessor: NodeId, arc: ArcId },
}

/// Node sequence and arc sequence of one augmenting path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentingPath {
    nodes: Vec<NodeId>,
    arcs: Vec<ArcId>,
}

impl AugmentingPath {
    /// Nodes from source to sink
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Arcs from source to sink; `arcs()[i]` joins `nodes()[i]` and `nodes()[i + 1]`
    pub fn arcs(&self) -> &[ArcId] {
        &self.arcs
    }

    /// Number of arcs
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }
}

/// Reusable BFS state for repeated searches on one residual graph
#[derive(Debug, Clone)]
pub struct AugmentingPathFinder {
    visits: Vec<Visit>,
    queue: VecDeque<NodeId>,
    discovered: usize,
}

impl AugmentingPathFinder {
    pub fn new(node_count: usize) -> Self {
        Self {
            visits: vec![Visit::Unvisited; node_count],
            queue: VecDeque::with_capacity(node_count),
            discovered: 0,
        }
    }

    fn reset(&mut self, node_count: usize) {
        self.visits.clear();
        self.visits.resize(node_count, Visit::Unvisited);
        self.queue.clear();
        self.discovered = 0;
    }

    /// Finds the shortest augmenting path from `source` to `sink`.
    ///
    /// Returns `None` when the sink is unreachable, and also when
    /// `source == sink` since no augmentation is possible.
    pub fn find(&mut self, graph: &ResidualGraph, source: NodeId, sink: NodeId) -> Option<AugmentingPath> {
        self.reset(graph.node_count());
        if source == sink {
            return None;
        }

        self.visits[source.0] = Visit::Root;
        self.discovered = 1;
        self.queue.push_back(source);

        while let Some(node) = self.queue.pop_front() {
            for (arc, next, residual) in graph.arcs_from(node) {
                if residual <= 0 || self.visits[next.0] != Visit::Unvisited {
                    continue;
                }
                self.visits[next.0] = Visit::Reached {
                    predecessor: node,
                    arc,
                };
                self.discovered += 1;
                if next == sink {
                    return self.path_to(sink);
                }
                self.queue.push_back(next);
            }
        }

        None
    }

    /// Walks predecessors from `target` back to the root of the last search.
    pub fn path_to(&self, target: NodeId) -> Option<AugmentingPath> {
        let mut nodes = vec![target];
        let mut arcs = Vec::new();
        let mut current = target;

        loop {
            match *self.visits.get(current.0)? {
                Visit::Root => break,
                Visit::Unvisited => return None,
                Visit::Reached { predecessor, arc } => {
                    arcs.push(arc);
                    nodes.push(predecessor);
                    current = predecessor;
                }
            }
        }

        nodes.reverse();
        arcs.reverse();
        Some(AugmentingPath { nodes, arcs })
    }

    /// Marker of `node` after the last search
    pub fn visit(&self, node: NodeId) -> Visit {
        self.visits.get(node.0).copied().unwrap_or(Visit::Unvisited)
    }

    /// Nodes marked visited by the last search, root included
    pub fn discovered(&self) -> usize {
        self.discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::Capacity;
    use crate::data_structures::graph::IndexedEdge;

    fn graph(node_count: usize, edges: &[(usize, usize, Capacity)]) -> ResidualGraph {
        let edges: Vec<IndexedEdge> = edges
            .iter()
            .map(|&(from, to, capacity)| IndexedEdge {
                from: NodeId(from),
                to: NodeId(to),
                capacity,
            })
            .collect();
        ResidualGraph::initialize(node_count, &edges)
    }

    #[test]
    fn test_finds_fewest_edge_path() {
        // 0 -> 1 -> 2 -> 4 and 0 -> 3 -> 4
        let residual = graph(5, &[(0, 1, 9), (1, 2, 9), (2, 4, 9), (0, 3, 1), (3, 4, 1)]);
        let mut finder = AugmentingPathFinder::new(5);

        let path = finder.find(&residual, NodeId(0), NodeId(4)).unwrap();
        assert_eq!(path.nodes(), &[NodeId(0), NodeId(3), NodeId(4)]);
        assert_eq!(path.len(), 2);
        assert_eq!(residual.endpoints(path.arcs()[0]), (NodeId(0), NodeId(3)));
    }

    #[test]
    fn test_tie_break_prefers_lower_labels() {
        // two shortest paths: 0 -> 1 -> 3 and 0 -> 2 -> 3
        let residual = graph(4, &[(0, 2, 1), (2, 3, 1), (0, 1, 1), (1, 3, 1)]);
        let mut finder = AugmentingPathFinder::new(4);

        let path = finder.find(&residual, NodeId(0), NodeId(3)).unwrap();
        assert_eq!(path.nodes(), &[NodeId(0), NodeId(1), NodeId(3)]);
    }

    #[test]
    fn test_skips_saturated_arcs() {
        let residual = graph(3, &[(0, 1, 0), (1, 2, 5)]);
        let mut finder = AugmentingPathFinder::new(3);

        assert!(finder.find(&residual, NodeId(0), NodeId(2)).is_none());
        assert_eq!(finder.visit(NodeId(0)), Visit::Root);
        assert_eq!(finder.visit(NodeId(1)), Visit::Unvisited);
        assert_eq!(finder.discovered(), 1);
    }

    #[test]
    fn test_uses_reverse_residual_arcs() {
        let mut residual = graph(4, &[(0, 1, 1), (1, 2, 1), (2, 3, 1), (0, 2, 1), (1, 3, 1)]);
        let mut finder = AugmentingPathFinder::new(4);

        // one unit along 0 -> 1 -> 2 -> 3 leaves only the 2 -> 1 reverse arc
        let forced = [
            residual.arc(NodeId(0), NodeId(1)).unwrap(),
            residual.arc(NodeId(1), NodeId(2)).unwrap(),
            residual.arc(NodeId(2), NodeId(3)).unwrap(),
        ];
        residual.apply(&forced, 1).unwrap();

        let path = finder.find(&residual, NodeId(0), NodeId(3)).unwrap();
        assert_eq!(path.nodes(), &[NodeId(0), NodeId(2), NodeId(1), NodeId(3)]);
    }

    #[test]
    fn test_source_equals_sink_has_no_path() {
        let residual = graph(2, &[(0, 1, 3)]);
        let mut finder = AugmentingPathFinder::new(2);
        assert!(finder.find(&residual, NodeId(0), NodeId(0)).is_none());
    }

    #[test]
    fn test_root_is_never_revisited() {
        // reverse arcs into the root gain capacity after a push
        let mut residual = graph(3, &[(0, 1, 2), (1, 2, 1)]);
        let mut finder = AugmentingPathFinder::new(3);

        let first = finder.find(&residual, NodeId(0), NodeId(2)).unwrap();
        residual.apply(first.arcs(), 1).unwrap();

        assert!(finder.find(&residual, NodeId(0), NodeId(2)).is_none());
        assert_eq!(finder.visit(NodeId(0)), Visit::Root);
        assert_eq!(finder.path_to(NodeId(2)), None);
    }
}
