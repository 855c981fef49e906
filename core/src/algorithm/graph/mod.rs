//! Maximum flow and minimum cut on capacitated directed graphs
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod augmenting_path;
pub mod max_flow;
pub mod min_cut;
pub mod residual;

pub use self::augmenting_path::{AugmentingPath, AugmentingPathFinder, Visit};
pub use self::max_flow::{EdgeFlow, FlowAssignment, FlowEngine, MaxFlowResult};
pub use self::min_cut::{MinCut, MinCutExtractor};
pub use self::residual::{ArcId, ResidualGraph};
