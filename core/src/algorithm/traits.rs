//! Core algorithm trait definitions for the flow engine
//!
//! Node labels are opaque to every algorithm in this crate: any ordered,
//! hashable, printable value can name a node. Internally each label is
//! interned to a dense [`NodeId`] so that hot loops index plain vectors
//! instead of hashing labels.
//!
//! # Key Design Principles
//! - Labels are ordered, and that order is the traversal tie-break
//! - Capacities are signed integers so that negative input can be rejected
//!   instead of silently wrapping
//! - Algorithms are stateless between runs; every run owns its residual state

use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::MaxFlowResult;
use crate::data_structures::graph::FlowProblem;
use crate::error::FlowError;
use crate::execution::tracer::{CancellationToken, TraceSink};

/// Capacity and flow value type.
///
/// Signed so that skew-symmetric flow (`flow(u, v) == -flow(v, u)`) and
/// rejected negative input share one representation.
pub type Capacity = i64;

/// Universal algorithm identifier for type-safe dispatch
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmId(String);

impl AlgorithmId {
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Dense node index assigned at construction time.
///
/// Indices follow ascending label order, so comparing two `NodeId`s of the
/// same network gives the same answer as comparing their labels.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Bound satisfied by every node label type.
///
/// `Ord` fixes the traversal order, `Display` renders trace lines and error
/// messages. Strings and integers qualify out of the box.
pub trait NodeLabel: Clone + Ord + Hash + Debug + Display + Send + Sync {}

impl<T> NodeLabel for T where T: Clone + Ord + Hash + Debug + Display + Send + Sync {}

/// Algorithm complexity information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmComplexity {
    pub time_complexity: String,
    pub space_complexity: String,
    /// Bound on the number of outer iterations
    pub iteration_bound: String,
}

/// Maximum flow algorithm trait
///
/// # Invariants
/// - State isolation between runs
/// - Deterministic behavior for given inputs
/// - Input is validated before any residual state is created
pub trait MaxFlowAlgorithm: Debug + Send + Sync {
    /// Returns the algorithm's unique identifier
    fn id(&self) -> AlgorithmId;

    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's asymptotic complexity in Big-O notation
    fn complexity(&self) -> AlgorithmComplexity;

    /// Computes the maximum flow of `problem`.
    ///
    /// `tracer` receives one line per augmentation; `cancel` is polled once
    /// per outer iteration.
    fn solve_traced<N: NodeLabel>(
        &self,
        problem: &FlowProblem<N>,
        tracer: Option<&mut dyn TraceSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<MaxFlowResult<N>, FlowError>;

    /// Computes the maximum flow of `problem` without tracing or cancellation.
    fn solve<N: NodeLabel>(&self, problem: &FlowProblem<N>) -> Result<MaxFlowResult<N>, FlowError> {
        self.solve_traced(problem, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_id_uniqueness() {
        let id1 = AlgorithmId::new("edmonds_karp");
        let id2 = AlgorithmId::new("dinic");
        let id3 = AlgorithmId::new("edmonds_karp");

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert_eq!(id1.as_str(), "edmonds_karp");
    }

    #[test]
    fn test_node_id_ordering() {
        let node1 = NodeId(4);
        let node2 = NodeId(4);
        let node3 = NodeId(7);

        assert_eq!(node1, node2);
        assert!(node1 < node3);
        assert_eq!(node3.as_usize(), 7);
    }

    fn assert_label<N: NodeLabel>() {}

    #[test]
    fn test_common_label_types() {
        assert_label::<String>();
        assert_label::<&'static str>();
        assert_label::<u32>();
        assert_label::<i64>();
    }
}
