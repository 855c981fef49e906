//! Flow network input model
//!
//! A [`FlowProblem`] is what a graph provider hands to the engine: a node
//! collection, an edge collection, and the two terminals. Validation turns
//! it into a [`ValidatedNetwork`], the only form the residual graph accepts,
//! so an invalid problem can never reach the mutation stage.
//!
//! # Normalization
//! - Duplicate node labels are ignored
//! - Labels are sorted ascending and interned to dense [`NodeId`]s
//! - Parallel edges on the same ordered pair are summed into one logical
//!   edge, kept at the position of its first declaration
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Capacity, NodeId, NodeLabel};
use crate::error::{InputError, TerminalRole};

/// Directed capacitated edge as declared by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge<N> {
    /// Tail node
    pub from: N,
    /// Head node
    pub to: N,
    /// Declared capacity
    pub capacity: Capacity,
}

impl<N> Edge<N> {
    pub fn new(from: N, to: N, capacity: Capacity) -> Self {
        Self { from, to, capacity }
    }
}

impl<N> From<(N, N, Capacity)> for Edge<N> {
    fn from((from, to, capacity): (N, N, Capacity)) -> Self {
        Self::new(from, to, capacity)
    }
}

impl<N: NodeLabel> Edge<N> {
    /// Resolves both endpoints and checks the edge in isolation.
    fn resolve(&self, index: &NodeIndex<N>) -> Result<(NodeId, NodeId), InputError> {
        let (Some(from), Some(to)) = (index.id_of(&self.from), index.id_of(&self.to)) else {
            return Err(InputError::UnknownEndpoint {
                from: self.from.to_string(),
                to: self.to.to_string(),
            });
        };
        if from == to {
            return Err(InputError::SelfLoop {
                node: self.from.to_string(),
            });
        }
        if self.capacity < 0 {
            return Err(InputError::NegativeCapacity {
                from: self.from.to_string(),
                to: self.to.to_string(),
                capacity: self.capacity,
            });
        }
        Ok((from, to))
    }
}

/// Edge expressed in dense indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub capacity: Capacity,
}

/// Sorted, deduplicated label table
///
/// Position in the table is the node's [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIndex<N> {
    labels: Vec<N>,
}

impl<N: NodeLabel> NodeIndex<N> {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = N>,
    {
        let mut labels: Vec<N> = labels.into_iter().collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    #[inline]
    pub fn id_of(&self, label: &N) -> Option<NodeId> {
        self.labels.binary_search(label).ok().map(NodeId)
    }

    /// Label of `id`. Panics if `id` does not belong to this index.
    #[inline]
    pub fn label(&self, id: NodeId) -> &N {
        &self.labels[id.0]
    }

    pub fn labels(&self) -> &[N] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.labels.len()).map(NodeId)
    }
}

/// A single-source, single-sink maximum flow problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowProblem<N> {
    nodes: Vec<N>,
    edges: Vec<Edge<N>>,
    source: N,
    sink: N,
}

impl<N: NodeLabel> FlowProblem<N> {
    pub fn new<I, E, T>(nodes: I, edges: E, source: N, sink: N) -> Self
    where
        I: IntoIterator<Item = N>,
        E: IntoIterator<Item = T>,
        T: Into<Edge<N>>,
    {
        Self {
            nodes: nodes.into_iter().collect(),
            edges: edges.into_iter().map(Into::into).collect(),
            source,
            sink,
        }
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge<N>] {
        &self.edges
    }

    pub fn source(&self) -> &N {
        &self.source
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Checks the whole problem and normalizes it.
    ///
    /// Terminals are checked first, then edges in declaration order; the
    /// first violation is returned. Capacities whose sums could overflow
    /// during the run (a pair and its reverse, or everything leaving the
    /// source) are rejected here as well.
    pub fn validate(&self) -> Result<ValidatedNetwork<N>, InputError> {
        let index = NodeIndex::from_labels(self.nodes.iter().cloned());

        let source = index
            .id_of(&self.source)
            .ok_or_else(|| InputError::UnknownTerminal {
                role: TerminalRole::Source,
                node: self.source.to_string(),
            })?;
        let sink = index
            .id_of(&self.sink)
            .ok_or_else(|| InputError::UnknownTerminal {
                role: TerminalRole::Sink,
                node: self.sink.to_string(),
            })?;

        let mut edges: Vec<IndexedEdge> = Vec::with_capacity(self.edges.len());
        let mut positions: HashMap<(NodeId, NodeId), usize> = HashMap::with_capacity(self.edges.len());

        for edge in &self.edges {
            let (from, to) = edge.resolve(&index)?;
            match positions.entry((from, to)) {
                Entry::Occupied(slot) => {
                    let merged = &mut edges[*slot.get()];
                    merged.capacity = merged.capacity.checked_add(edge.capacity).ok_or_else(|| {
                        InputError::CapacityOverflow {
                            from: edge.from.to_string(),
                            to: edge.to.to_string(),
                        }
                    })?;
                }
                Entry::Vacant(slot) => {
                    slot.insert(edges.len());
                    edges.push(IndexedEdge {
                        from,
                        to,
                        capacity: edge.capacity,
                    });
                }
            }
        }

        let overflow = |from: NodeId, to: NodeId| InputError::CapacityOverflow {
            from: index.label(from).to_string(),
            to: index.label(to).to_string(),
        };

        // residual of an arc can reach the capacity of both directions
        for edge in &edges {
            if let Some(&reverse) = positions.get(&(edge.to, edge.from)) {
                if edge.capacity.checked_add(edges[reverse].capacity).is_none() {
                    return Err(overflow(edge.from, edge.to));
                }
            }
        }

        // source outflow bounds the total flow
        if source != sink {
            edges
                .iter()
                .filter(|edge| edge.from == source)
                .try_fold(0 as Capacity, |total, edge| {
                    total.checked_add(edge.capacity).ok_or_else(|| overflow(edge.from, edge.to))
                })?;
        }

        Ok(ValidatedNetwork {
            index,
            source,
            sink,
            edges,
        })
    }
}

/// A problem that passed validation
///
/// Holds one [`IndexedEdge`] per distinct ordered pair, in first-declaration
/// order, with capacities of parallel edges summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedNetwork<N> {
    index: NodeIndex<N>,
    source: NodeId,
    sink: NodeId,
    edges: Vec<IndexedEdge>,
}

impl<N: NodeLabel> ValidatedNetwork<N> {
    pub fn index(&self) -> &NodeIndex<N> {
        &self.index
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn edges(&self) -> &[IndexedEdge] {
        &self.edges
    }

    /// Logical edges with their labels restored
    pub fn labelled_edges(&self) -> Vec<Edge<N>> {
        self.edges
            .iter()
            .map(|edge| {
                Edge::new(
                    self.index.label(edge.from).clone(),
                    self.index.label(edge.to).clone(),
                    edge.capacity,
                )
            })
            .collect()
    }
}
