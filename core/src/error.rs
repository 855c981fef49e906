//! Error types for flow computation
//!
//! Failures are structural (bad input) or caller-initiated (cancellation);
//! nothing here is transient, so there is no retry classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::Capacity;

/// Which terminal of a flow problem an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalRole {
    Source,
    Sink,
}

impl fmt::Display for TerminalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalRole::Source => write!(f, "source"),
            TerminalRole::Sink => write!(f, "sink"),
        }
    }
}

/// Rejected input, detected before any residual state exists.
///
/// Labels are stored in their `Display` rendering so the error type does not
/// depend on the label type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("edge {from} -> {to} has negative capacity {capacity}")]
    NegativeCapacity {
        from: String,
        to: String,
        capacity: Capacity,
    },

    #[error("self-loop on node {node}")]
    SelfLoop { node: String },

    #[error("{role} {node} is not in the node collection")]
    UnknownTerminal { role: TerminalRole, node: String },

    #[error("edge {from} -> {to} references a node outside the node collection")]
    UnknownEndpoint { from: String, to: String },

    #[error("summed capacity at {from} -> {to} overflows")]
    CapacityOverflow { from: String, to: String },
}

/// Errors surfaced by a flow run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The run stopped between augmentations. `partial_flow` is the flow
    /// pushed by the `completed_steps` finished augmentations and is NOT a
    /// maximum flow.
    #[error("run cancelled after {completed_steps} augmentations (partial flow {partial_flow}, incomplete)")]
    Cancelled {
        completed_steps: usize,
        partial_flow: Capacity,
    },

    #[error("internal flow error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Returns true for the cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FlowError::Cancelled { .. })
    }
}

/// Errors raised when reading back an augmentation history
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("step {step} is out of range (history has {len} steps)")]
    InvalidStep { step: usize, len: usize },

    #[error("residual entry {from} -> {to} is not part of the snapshot")]
    UnknownEntry { from: String, to: String },

    #[error("residual entry {from} -> {to} appears more than once")]
    DuplicateEntry { from: String, to: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
