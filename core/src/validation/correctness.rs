//! Flow Certificate Verification
//!
//! Re-checks a finished run against the problem it was computed for, without
//! trusting any of the engine's internal state. A maximum flow is certified by
//! three independent facts: the assignment is feasible (capacity, skew
//! symmetry, conservation), the history accounts for every unit of flow, and
//! a cut of equal capacity exists in the terminal residual graph.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::graph::max_flow::MaxFlowResult;
use crate::algorithm::graph::min_cut::MinCutExtractor;
use crate::algorithm::traits::{Capacity, NodeLabel};
use crate::data_structures::graph::FlowProblem;

/// A single failed property of a run
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvariantViolation {
    #[error("Problem does not validate: {0}")]
    InvalidProblem(String),

    #[error("Net flow {from} -> {to} is {flow}, capacity is {capacity}")]
    CapacityExceeded {
        from: String,
        to: String,
        flow: Capacity,
        capacity: Capacity,
    },

    #[error("Net flow {from} -> {to} is {forward} but {to} -> {from} is {backward}")]
    SkewAsymmetry {
        from: String,
        to: String,
        forward: Capacity,
        backward: Capacity,
    },

    #[error("Node {node} has flow imbalance {imbalance}")]
    ConservationBroken { node: String, imbalance: i128 },

    #[error("Net outflow of {terminal} is {outflow}, total flow is {total}")]
    TerminalMismatch {
        terminal: String,
        outflow: i128,
        total: Capacity,
    },

    #[error("Bottlenecks sum to {sum}, total flow is {total}")]
    HistorySumMismatch { sum: i128, total: Capacity },

    #[error("Step {step} records cumulative flow {recorded}, expected {expected}")]
    CumulativeMismatch {
        step: usize,
        expected: i128,
        recorded: Capacity,
    },

    #[error("Step {step} is numbered {recorded}")]
    StepNumbering { step: usize, recorded: usize },

    #[error("Step {step} has non-positive bottleneck {bottleneck}")]
    NonPositiveBottleneck { step: usize, bottleneck: Capacity },

    #[error("Step {step} path does not run from source to sink")]
    PathEndpoints { step: usize },

    #[error("History cannot be replayed: {0}")]
    HistoryReplay(String),

    #[error("Residual {from} -> {to} is {recorded}, expected {expected}")]
    ResidualMismatch {
        from: String,
        to: String,
        expected: Capacity,
        recorded: Capacity,
    },

    #[error("Minimum cut is missing")]
    MissingCut,

    #[error("Cut does not separate source from sink")]
    CutNotSeparating,

    #[error("Cut capacity {cut} differs from total flow {total}")]
    CutCapacityMismatch { cut: Capacity, total: Capacity },

    #[error("Cut differs from the one implied by the final residual state")]
    CutMismatch,
}

/// Outcome of [`verify`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub violations: Vec<InvariantViolation>,
    /// Ordered node pairs whose flow was checked
    pub edges_checked: usize,
    pub nodes_checked: usize,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks `result` against `problem`.
///
/// All checks run even after a failure, so the report lists every violation.
pub fn verify<N: NodeLabel>(problem: &FlowProblem<N>, result: &MaxFlowResult<N>) -> VerificationReport {
    let mut report = VerificationReport::default();

    let network = match problem.validate() {
        Ok(network) => network,
        Err(err) => {
            report.violations.push(InvariantViolation::InvalidProblem(err.to_string()));
            return report;
        }
    };

    let total = result.total_flow();
    let labelled = network.labelled_edges();

    let mut capacities: HashMap<(&N, &N), Capacity> = HashMap::new();
    let mut pairs: BTreeSet<(&N, &N)> = BTreeSet::new();
    for edge in &labelled {
        capacities.insert((&edge.from, &edge.to), edge.capacity);
        pairs.insert(if edge.from < edge.to {
            (&edge.from, &edge.to)
        } else {
            (&edge.to, &edge.from)
        });
    }
    let capacity_of = |from: &N, to: &N| capacities.get(&(from, to)).copied().unwrap_or(0);

    // feasibility
    let mut balance: BTreeMap<&N, i128> = network.index().labels().iter().map(|node| (node, 0)).collect();
    for &(a, b) in &pairs {
        let forward = result.net_flow(a, b);
        let backward = result.net_flow(b, a);
        if forward != -backward {
            report.violations.push(InvariantViolation::SkewAsymmetry {
                from: a.to_string(),
                to: b.to_string(),
                forward,
                backward,
            });
        }
        for (from, to, flow) in [(a, b, forward), (b, a, backward)] {
            let capacity = capacity_of(from, to);
            if flow > capacity {
                report.violations.push(InvariantViolation::CapacityExceeded {
                    from: from.to_string(),
                    to: to.to_string(),
                    flow,
                    capacity,
                });
            }
        }
        if let Some(out) = balance.get_mut(a) {
            *out += i128::from(forward);
        }
        if let Some(out) = balance.get_mut(b) {
            *out -= i128::from(forward);
        }
        report.edges_checked += 2;
    }

    for (node, &imbalance) in &balance {
        report.nodes_checked += 1;
        if network.source() == network.sink() {
            if imbalance != 0 {
                report.violations.push(InvariantViolation::ConservationBroken {
                    node: node.to_string(),
                    imbalance,
                });
            }
            continue;
        }
        let expected = if *node == problem.source() {
            i128::from(total)
        } else if *node == problem.sink() {
            -i128::from(total)
        } else {
            0
        };
        if imbalance == expected {
            continue;
        }
        if expected == 0 {
            report.violations.push(InvariantViolation::ConservationBroken {
                node: node.to_string(),
                imbalance,
            });
        } else {
            report.violations.push(InvariantViolation::TerminalMismatch {
                terminal: node.to_string(),
                outflow: imbalance,
                total,
            });
        }
    }

    // history
    let history = result.history();
    let mut cumulative: i128 = 0;
    for (idx, step) in history.iter().enumerate() {
        let number = idx + 1;
        if step.step() != number {
            report.violations.push(InvariantViolation::StepNumbering {
                step: number,
                recorded: step.step(),
            });
        }
        if step.bottleneck() <= 0 {
            report.violations.push(InvariantViolation::NonPositiveBottleneck {
                step: number,
                bottleneck: step.bottleneck(),
            });
        }
        if step.path().first() != Some(problem.source()) || step.path().last() != Some(problem.sink()) {
            report.violations.push(InvariantViolation::PathEndpoints { step: number });
        }
        cumulative += i128::from(step.bottleneck());
        if cumulative != i128::from(step.cumulative_flow()) {
            report.violations.push(InvariantViolation::CumulativeMismatch {
                step: number,
                expected: cumulative,
                recorded: step.cumulative_flow(),
            });
        }
    }
    if cumulative != i128::from(total) {
        report.violations.push(InvariantViolation::HistorySumMismatch { sum: cumulative, total });
    }

    // residual state and cut
    let Some(cut) = result.min_cut() else {
        if network.source() != network.sink() {
            report.violations.push(InvariantViolation::MissingCut);
        }
        return finish(report);
    };

    if !cut.separates(problem.source(), problem.sink()) {
        report.violations.push(InvariantViolation::CutNotSeparating);
    }
    if cut.capacity() != total {
        report.violations.push(InvariantViolation::CutCapacityMismatch {
            cut: cut.capacity(),
            total,
        });
    }

    let terminal = match history.final_residual() {
        Ok(terminal) => terminal,
        Err(err) => {
            report.violations.push(InvariantViolation::HistoryReplay(err.to_string()));
            return finish(report);
        }
    };

    for entry in terminal.entries() {
        let expected = capacity_of(&entry.from, &entry.to) - result.net_flow(&entry.from, &entry.to);
        if entry.residual != expected {
            report.violations.push(InvariantViolation::ResidualMismatch {
                from: entry.from.to_string(),
                to: entry.to.to_string(),
                expected,
                recorded: entry.residual,
            });
        }
    }

    let recomputed = MinCutExtractor::extract(network.index().labels(), &labelled, problem.source(), &terminal);
    if &recomputed != cut {
        report.violations.push(InvariantViolation::CutMismatch);
    }

    finish(report)
}

fn finish(report: VerificationReport) -> VerificationReport {
    debug!(
        "verification: {} pairs, {} nodes, {} violations",
        report.edges_checked,
        report.nodes_checked,
        report.violations.len()
    );
    report
}
