//! Minimum cut extraction from a terminal residual state
//!
//! After the last augmentation the nodes reachable from the source through
//! positive residual arcs form the source side `S`; everything else is `T`.
//! Every original edge leaving `S` is saturated, so the summed ORIGINAL
//! capacity of those edges equals the maximum flow.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Capacity, NodeLabel};
use crate::data_structures::graph::Edge;
use crate::execution::history::ResidualSnapshot;

/// Source/sink partition and the edges crossing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinCut<N: Ord> {
    source_side: BTreeSet<N>,
    sink_side: BTreeSet<N>,
    cut_edges: Vec<Edge<N>>,
    capacity: Capacity,
}

impl<N: NodeLabel> MinCut<N> {
    /// Nodes reachable from the source in the terminal residual graph
    pub fn source_side(&self) -> &BTreeSet<N> {
        &self.source_side
    }

    pub fn sink_side(&self) -> &BTreeSet<N> {
        &self.sink_side
    }

    /// Original edges from `S` to `T` with their original capacities
    pub fn cut_edges(&self) -> &[Edge<N>] {
        &self.cut_edges
    }

    /// Sum of the original capacities of the cut edges
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn separates(&self, source: &N, sink: &N) -> bool {
        self.source_side.contains(source) && self.sink_side.contains(sink)
    }
}

/// Computes the reachable-from-source partition of a residual snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct MinCutExtractor;

impl MinCutExtractor {
    /// Extracts the cut for `source` from `residual`.
    ///
    /// `nodes` is the node universe (nodes absent from the snapshot end up
    /// in `T` unless they are the source). Parallel `original_edges` are
    /// merged into one logical edge at the position of their first
    /// declaration.
    pub fn extract<N: NodeLabel>(
        nodes: &[N],
        original_edges: &[Edge<N>],
        source: &N,
        residual: &ResidualSnapshot<N>,
    ) -> MinCut<N> {
        let mut adjacency: BTreeMap<&N, Vec<&N>> = BTreeMap::new();
        for entry in residual.positive() {
            adjacency.entry(&entry.from).or_default().push(&entry.to);
        }

        let mut reached: BTreeSet<&N> = BTreeSet::new();
        let mut queue = VecDeque::new();
        reached.insert(source);
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            for &next in adjacency.get(node).into_iter().flatten() {
                if reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        let source_side: BTreeSet<N> = reached.iter().map(|&node| node.clone()).collect();
        let sink_side: BTreeSet<N> = nodes
            .iter()
            .filter(|node| !source_side.contains(*node))
            .cloned()
            .collect();

        let mut cut_edges: Vec<Edge<N>> = Vec::new();
        let mut positions: HashMap<(&N, &N), usize> = HashMap::new();
        for edge in original_edges {
            if !source_side.contains(&edge.from) || !sink_side.contains(&edge.to) {
                continue;
            }
            match positions.entry((&edge.from, &edge.to)) {
                Entry::Occupied(slot) => {
                    let merged = &mut cut_edges[*slot.get()];
                    merged.capacity = merged.capacity.saturating_add(edge.capacity);
                }
                Entry::Vacant(slot) => {
                    slot.insert(cut_edges.len());
                    cut_edges.push(edge.clone());
                }
            }
        }

        let capacity = cut_edges
            .iter()
            .fold(0 as Capacity, |total, edge| total.saturating_add(edge.capacity));

        MinCut {
            source_side,
            sink_side,
            cut_edges,
            capacity,
        }
    }
}
