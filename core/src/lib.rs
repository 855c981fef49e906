//! flowtrace: Edmonds-Karp maximum flow with an auditable augmentation history
//!
//! The engine computes a maximum flow and a matching minimum cut on a
//! capacitated directed graph using breadth-first shortest augmenting paths,
//! and records every augmentation it performs: the path, its bottleneck, the
//! cumulative flow, and the residual state right after the push.
//!
//! ```
//! use flowtrace::{Edge, FlowEngine, FlowProblem, MaxFlowAlgorithm};
//!
//! let edges = vec![
//!     Edge::new("A", "B", 2),
//!     Edge::new("A", "C", 3),
//!     Edge::new("B", "D", 3),
//!     Edge::new("C", "D", 2),
//! ];
//! let problem = FlowProblem::new(vec!["A", "B", "C", "D"], edges, "A", "D");
//! let result = FlowEngine::default().solve(&problem).unwrap();
//!
//! assert_eq!(result.total_flow(), 4);
//! assert_eq!(result.history().len(), 2);
//! assert_eq!(result.min_cut().unwrap().capacity(), 4);
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod execution;
pub mod validation;

pub use algorithm::graph::{
    AugmentingPath, AugmentingPathFinder, EdgeFlow, FlowAssignment, FlowEngine, MaxFlowResult, MinCut,
    MinCutExtractor, ResidualGraph,
};
pub use algorithm::traits::{Capacity, MaxFlowAlgorithm, NodeId, NodeLabel};
pub use config::{FlowConfig, SnapshotMode};
pub use data_structures::graph::{Edge, FlowProblem};
pub use error::{FlowError, HistoryError, InputError, TerminalRole};
pub use execution::history::{FlowHistory, HistoryStep, ResidualEntry, ResidualSnapshot, StepResidual};
pub use execution::tracer::{CancellationToken, CollectingTraceSink, LogTraceSink, TraceSink};
