//! Augmentation history for audit and replay
//!
//! Every augmentation appends one immutable [`HistoryStep`]. Depending on
//! [`SnapshotMode`] a step carries either the complete residual table or only
//! the entries that augmentation touched. [`FlowHistory`] keeps the residual
//! table from before the first augmentation, so the state after any step can
//! be reconstructed in either mode by replaying steps in order.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Capacity, NodeLabel};
use crate::config::SnapshotMode;
use crate::error::HistoryError;

/// Residual capacity of one directed arc
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidualEntry<N> {
    pub from: N,
    pub to: N,
    pub residual: Capacity,
}

/// Value copy of a residual table
///
/// Entries are sorted by `(from, to)` label order; lookups binary search.
/// Deserialized tables are re-sorted and must not repeat a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "SnapshotEntries<N>",
    bound(deserialize = "N: NodeLabel + Deserialize<'de>")
)]
pub struct ResidualSnapshot<N> {
    entries: Vec<ResidualEntry<N>>,
}

/// Wire form of [`ResidualSnapshot`] before the ordering check
#[derive(Deserialize)]
struct SnapshotEntries<N> {
    entries: Vec<ResidualEntry<N>>,
}

impl<N: NodeLabel> TryFrom<SnapshotEntries<N>> for ResidualSnapshot<N> {
    type Error = HistoryError;

    fn try_from(raw: SnapshotEntries<N>) -> Result<Self, Self::Error> {
        let mut entries = raw.entries;
        entries.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].from == pair[1].from && pair[0].to == pair[1].to)
        {
            return Err(HistoryError::DuplicateEntry {
                from: pair[0].from.to_string(),
                to: pair[0].to.to_string(),
            });
        }
        Ok(Self { entries })
    }
}

impl<N> Default for ResidualSnapshot<N> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<N: NodeLabel> ResidualSnapshot<N> {
    /// Wraps entries already sorted by `(from, to)`.
    pub(crate) fn from_sorted(entries: Vec<ResidualEntry<N>>) -> Self {
        debug_assert!(entries
            .windows(2)
            .all(|pair| (&pair[0].from, &pair[0].to) < (&pair[1].from, &pair[1].to)));
        Self { entries }
    }

    fn position(&self, from: &N, to: &N) -> Option<usize> {
        self.entries
            .binary_search_by(|entry| (&entry.from, &entry.to).cmp(&(from, to)))
            .ok()
    }

    /// Residual capacity of `from -> to`, `None` when the pair is untracked
    pub fn residual(&self, from: &N, to: &N) -> Option<Capacity> {
        self.position(from, to).map(|pos| self.entries[pos].residual)
    }

    pub fn entries(&self) -> &[ResidualEntry<N>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arcs that can still carry flow
    pub fn positive(&self) -> impl Iterator<Item = &ResidualEntry<N>> + '_ {
        self.entries.iter().filter(|entry| entry.residual > 0)
    }

    /// Overwrites the entries named in `diff`.
    pub(crate) fn apply_diff(&mut self, diff: &[ResidualEntry<N>]) -> Result<(), HistoryError> {
        for change in diff {
            let pos = self
                .position(&change.from, &change.to)
                .ok_or_else(|| HistoryError::UnknownEntry {
                    from: change.from.to_string(),
                    to: change.to.to_string(),
                })?;
            self.entries[pos].residual = change.residual;
        }
        Ok(())
    }
}

/// Residual state recorded with a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    content = "entries",
    rename_all = "snake_case",
    bound(deserialize = "N: NodeLabel + Deserialize<'de>")
)]
pub enum StepResidual<N> {
    /// Whole table after the step
    Full(ResidualSnapshot<N>),
    /// Only the entries changed by the step, with their new values
    Delta(Vec<ResidualEntry<N>>),
}

/// One completed augmentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "N: NodeLabel + Deserialize<'de>"))]
pub struct HistoryStep<N> {
    step: usize,
    path: Vec<N>,
    edges: Vec<(N, N)>,
    bottleneck: Capacity,
    cumulative_flow: Capacity,
    residual: StepResidual<N>,
}

impl<N: NodeLabel> HistoryStep<N> {
    pub(crate) fn new(
        step: usize,
        path: Vec<N>,
        bottleneck: Capacity,
        cumulative_flow: Capacity,
        residual: StepResidual<N>,
    ) -> Self {
        let edges = path
            .windows(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Self {
            step,
            path,
            edges,
            bottleneck,
            cumulative_flow,
            residual,
        }
    }

    /// 1-based step number
    pub fn step(&self) -> usize {
        self.step
    }

    /// Nodes of the augmenting path, source first
    pub fn path(&self) -> &[N] {
        &self.path
    }

    /// Residual arcs traversed, in path order
    pub fn edges(&self) -> &[(N, N)] {
        &self.edges
    }

    pub fn bottleneck(&self) -> Capacity {
        self.bottleneck
    }

    /// Total flow after this step
    pub fn cumulative_flow(&self) -> Capacity {
        self.cumulative_flow
    }

    pub fn residual(&self) -> &StepResidual<N> {
        &self.residual
    }

    /// Full snapshot, when the step was recorded in [`SnapshotMode::Full`]
    pub fn snapshot(&self) -> Option<&ResidualSnapshot<N>> {
        match &self.residual {
            StepResidual::Full(snapshot) => Some(snapshot),
            StepResidual::Delta(_) => None,
        }
    }
}

/// Ordered augmentation history of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "N: NodeLabel + Deserialize<'de>"))]
pub struct FlowHistory<N> {
    mode: SnapshotMode,
    initial: ResidualSnapshot<N>,
    steps: Vec<HistoryStep<N>>,
}

impl<N: NodeLabel> FlowHistory<N> {
    pub(crate) fn new(mode: SnapshotMode, initial: ResidualSnapshot<N>) -> Self {
        Self {
            mode,
            initial,
            steps: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, step: HistoryStep<N>) {
        debug_assert_eq!(step.step, self.steps.len() + 1);
        self.steps.push(step);
    }

    pub fn mode(&self) -> SnapshotMode {
        self.mode
    }

    pub fn steps(&self) -> &[HistoryStep<N>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryStep<N>> {
        self.steps.iter()
    }

    /// Step by its 1-based number
    pub fn get(&self, step: usize) -> Option<&HistoryStep<N>> {
        step.checked_sub(1).and_then(|idx| self.steps.get(idx))
    }

    /// Residual table before any augmentation
    pub fn initial_residual(&self) -> &ResidualSnapshot<N> {
        &self.initial
    }

    /// Sum of all bottlenecks
    pub fn total_bottleneck(&self) -> Capacity {
        self.steps.iter().map(|step| step.bottleneck).sum()
    }

    /// Residual table after step `step` (`0` is the state before the first
    /// augmentation).
    ///
    /// Starts from the nearest full snapshot at or before `step` and replays
    /// the deltas after it.
    pub fn residual_at(&self, step: usize) -> Result<ResidualSnapshot<N>, HistoryError> {
        if step > self.steps.len() {
            return Err(HistoryError::InvalidStep {
                step,
                len: self.steps.len(),
            });
        }

        let base = self.steps[..step]
            .iter()
            .rposition(|recorded| matches!(recorded.residual, StepResidual::Full(_)));

        let (mut state, replay_from) = match base {
            Some(idx) => match &self.steps[idx].residual {
                StepResidual::Full(snapshot) => (snapshot.clone(), idx + 1),
                StepResidual::Delta(_) => (self.initial.clone(), 0),
            },
            None => (self.initial.clone(), 0),
        };

        for recorded in &self.steps[replay_from..step] {
            match &recorded.residual {
                StepResidual::Delta(diff) => state.apply_diff(diff)?,
                StepResidual::Full(snapshot) => state = snapshot.clone(),
            }
        }

        Ok(state)
    }

    /// Residual table after the last step
    pub fn final_residual(&self) -> Result<ResidualSnapshot<N>, HistoryError> {
        self.residual_at(self.steps.len())
    }
}

impl<N: NodeLabel + Serialize> FlowHistory<N> {
    /// Pretty JSON rendering for audit export
    pub fn to_json(&self) -> Result<String, HistoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<'a, N> IntoIterator for &'a FlowHistory<N> {
    type Item = &'a HistoryStep<N>;
    type IntoIter = std::slice::Iter<'a, HistoryStep<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
