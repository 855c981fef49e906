//! Residual graph with paired reverse arcs
//!
//! Every ordered node pair touched by the input owns two arcs, `u -> v` and
//! `v -> u`, linked as twins. An arc carries its residual capacity and its
//! signed flow; pushing along an arc moves capacity to the twin and negates
//! the flow change there, so skew symmetry holds after every push.
//!
//! Adjacency lists are sorted by head [`NodeId`], which is ascending label
//! order. Traversals that walk them in order inherit a fixed tie-break.

use std::collections::{HashMap, HashSet};

use crate::algorithm::traits::{Capacity, NodeId, NodeLabel};
use crate::data_structures::graph::{IndexedEdge, NodeIndex};
use crate::error::FlowError;
use crate::execution::history::{ResidualEntry, ResidualSnapshot};

/// Arc handle within a [`ResidualGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcId(pub usize);

#[derive(Debug, Clone)]
struct ResidualArc {
    from: NodeId,
    to: NodeId,
    /// Capacity declared for this direction (0 for pure reverse arcs)
    capacity: Capacity,
    residual: Capacity,
    flow: Capacity,
    twin: ArcId,
}

/// Capacity and flow state of one run
#[derive(Debug, Clone)]
pub struct ResidualGraph {
    adjacency: Vec<Vec<ArcId>>,
    arcs: Vec<ResidualArc>,
    pairs: HashMap<(NodeId, NodeId), ArcId>,
}

impl ResidualGraph {
    /// Builds the residual graph of a validated network.
    ///
    /// Takes [`IndexedEdge`]s, which only exist for edges that passed
    /// validation, so negative capacities and self-loops never reach here.
    /// Capacities on the same ordered pair accumulate; an antiparallel edge
    /// adds to the twin arc of the existing pair.
    pub fn initialize(node_count: usize, edges: &[IndexedEdge]) -> Self {
        let mut graph = Self {
            adjacency: vec![Vec::new(); node_count],
            arcs: Vec::with_capacity(edges.len() * 2),
            pairs: HashMap::with_capacity(edges.len() * 2),
        };

        for edge in edges {
            debug_assert!(edge.capacity >= 0 && edge.from != edge.to);
            let arc = graph.ensure_pair(edge.from, edge.to);
            let arc = &mut graph.arcs[arc.0];
            arc.capacity += edge.capacity;
            arc.residual += edge.capacity;
        }

        let arcs = &graph.arcs;
        for list in graph.adjacency.iter_mut() {
            list.sort_unstable_by_key(|arc| arcs[arc.0].to);
        }

        graph
    }

    fn ensure_pair(&mut self, from: NodeId, to: NodeId) -> ArcId {
        if let Some(&arc) = self.pairs.get(&(from, to)) {
            return arc;
        }

        let forward = ArcId(self.arcs.len());
        let backward = ArcId(forward.0 + 1);
        self.arcs.push(ResidualArc {
            from,
            to,
            capacity: 0,
            residual: 0,
            flow: 0,
            twin: backward,
        });
        self.arcs.push(ResidualArc {
            from: to,
            to: from,
            capacity: 0,
            residual: 0,
            flow: 0,
            twin: forward,
        });
        self.adjacency[from.0].push(forward);
        self.adjacency[to.0].push(backward);
        self.pairs.insert((from, to), forward);
        self.pairs.insert((to, from), backward);
        forward
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn arc(&self, from: NodeId, to: NodeId) -> Option<ArcId> {
        self.pairs.get(&(from, to)).copied()
    }

    pub fn endpoints(&self, arc: ArcId) -> (NodeId, NodeId) {
        let arc = &self.arcs[arc.0];
        (arc.from, arc.to)
    }

    #[inline]
    pub fn residual_of(&self, arc: ArcId) -> Capacity {
        self.arcs[arc.0].residual
    }

    /// Residual capacity of `from -> to`, 0 for pairs absent from the input
    pub fn residual(&self, from: NodeId, to: NodeId) -> Capacity {
        self.arc(from, to).map_or(0, |arc| self.arcs[arc.0].residual)
    }

    /// Signed flow on `from -> to`
    pub fn net_flow(&self, from: NodeId, to: NodeId) -> Capacity {
        self.arc(from, to).map_or(0, |arc| self.arcs[arc.0].flow)
    }

    /// Capacity declared for exactly this direction
    pub fn capacity(&self, from: NodeId, to: NodeId) -> Capacity {
        self.arc(from, to).map_or(0, |arc| self.arcs[arc.0].capacity)
    }

    /// Outgoing arcs of `node` in ascending head order, with their residuals
    pub(crate) fn arcs_from(&self, node: NodeId) -> impl Iterator<Item = (ArcId, NodeId, Capacity)> + '_ {
        self.adjacency[node.0].iter().map(move |&arc| {
            let state = &self.arcs[arc.0];
            (arc, state.to, state.residual)
        })
    }

    /// Pushes `amount` along every arc of `path`.
    ///
    /// The whole path is checked before anything changes: either every arc
    /// is updated or none is.
    pub fn apply(&mut self, path: &[ArcId], amount: Capacity) -> Result<(), FlowError> {
        if amount <= 0 {
            return Err(FlowError::Internal(format!(
                "augmentation amount must be positive, got {amount}"
            )));
        }

        let mut seen = HashSet::with_capacity(path.len());
        for &arc in path {
            let state = self
                .arcs
                .get(arc.0)
                .ok_or_else(|| FlowError::Internal(format!("unknown arc {}", arc.0)))?;
            if !seen.insert(arc) {
                return Err(FlowError::Internal(format!("arc {} repeats on the path", arc.0)));
            }
            if state.residual < amount {
                return Err(FlowError::Internal(format!(
                    "arc {} -> {} has residual {} below push amount {}",
                    state.from.0, state.to.0, state.residual, amount
                )));
            }
            if self.arcs[state.twin.0].residual.checked_add(amount).is_none() {
                return Err(FlowError::Internal(format!(
                    "reverse residual of arc {} -> {} overflows",
                    state.from.0, state.to.0
                )));
            }
        }

        for &arc in path {
            let twin = self.arcs[arc.0].twin;
            let forward = &mut self.arcs[arc.0];
            forward.residual -= amount;
            forward.flow += amount;
            let backward = &mut self.arcs[twin.0];
            backward.residual += amount;
            backward.flow -= amount;
        }

        Ok(())
    }

    /// Independent copy of the whole residual table
    pub fn snapshot<N: NodeLabel>(&self, index: &NodeIndex<N>) -> ResidualSnapshot<N> {
        let mut entries = Vec::with_capacity(self.arcs.len());
        for list in &self.adjacency {
            for &arc in list {
                entries.push(self.entry(index, arc));
            }
        }
        ResidualSnapshot::from_sorted(entries)
    }

    /// Entries of `path` and of their twins, sorted like a snapshot
    pub(crate) fn touched_entries<N: NodeLabel>(
        &self,
        index: &NodeIndex<N>,
        path: &[ArcId],
    ) -> Vec<ResidualEntry<N>> {
        let mut touched: Vec<ArcId> = path
            .iter()
            .flat_map(|&arc| [arc, self.arcs[arc.0].twin])
            .collect();
        touched.sort_unstable_by_key(|arc| {
            let state = &self.arcs[arc.0];
            (state.from, state.to)
        });
        touched.dedup();
        touched.into_iter().map(|arc| self.entry(index, arc)).collect()
    }

    fn entry<N: NodeLabel>(&self, index: &NodeIndex<N>, arc: ArcId) -> ResidualEntry<N> {
        let state = &self.arcs[arc.0];
        ResidualEntry {
            from: index.label(state.from).clone(),
            to: index.label(state.to).clone(),
            residual: state.residual,
        }
    }

    /// Checks `flow(u, v) == -flow(v, u)` on every pair
    pub fn is_skew_symmetric(&self) -> bool {
        self.arcs
            .iter()
            .all(|arc| arc.flow == -self.arcs[arc.twin.0].flow)
    }
}
