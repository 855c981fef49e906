//! Input data structures

pub mod graph;

pub use self::graph::{Edge, FlowProblem, IndexedEdge, NodeIndex, ValidatedNetwork};
