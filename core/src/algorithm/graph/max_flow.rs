//! Edmonds-Karp Maximum Flow Implementation
//!
//! This module drives the shortest-augmenting-path method: repeated
//! breadth-first searches over the residual graph, each successful search
//! followed by a push of the path bottleneck. Every push is recorded as an
//! immutable history step, and the terminal residual state is handed to the
//! min-cut extractor.
//!
//! # Complexity
//! Each augmentation raises the total flow by at least one unit, so the loop
//! terminates. Choosing a fewest-arc path every time bounds the number of
//! augmentations by O(V·E), giving O(V·E²) overall.
//!
//! # Concurrency
//! A run exclusively owns its residual graph; nothing inside a run is
//! parallel. Independent problems can be solved concurrently with
//! [`FlowEngine::run_batch`].
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::algorithm::graph::augmenting_path::AugmentingPathFinder;
use crate::algorithm::graph::min_cut::{MinCut, MinCutExtractor};
use crate::algorithm::graph::residual::{ArcId, ResidualGraph};
use crate::algorithm::traits::{
    AlgorithmComplexity, AlgorithmId, Capacity, MaxFlowAlgorithm, NodeId, NodeLabel,
};
use crate::config::{FlowConfig, SnapshotMode};
use crate::data_structures::graph::{Edge, FlowProblem, IndexedEdge, NodeIndex, ValidatedNetwork};
use crate::error::FlowError;
use crate::execution::history::{FlowHistory, HistoryStep, ResidualSnapshot, StepResidual};
use crate::execution::tracer::{format_step_line, CancellationToken, TraceSink};

/// Flow carried by one logical input edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFlow<'a, N> {
    pub from: &'a N,
    pub to: &'a N,
    /// Original capacity (parallel edges summed)
    pub capacity: Capacity,
    /// Flow in the declared direction, `0 <= flow <= capacity`
    pub flow: Capacity,
}

/// Final flow assignment, queryable by label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAssignment<N> {
    index: NodeIndex<N>,
    edges: Vec<IndexedEdge>,
    capacities: HashMap<(NodeId, NodeId), Capacity>,
    net: HashMap<(NodeId, NodeId), Capacity>,
}

impl<N: NodeLabel> FlowAssignment<N> {
    fn zero(network: &ValidatedNetwork<N>) -> Self {
        Self {
            index: network.index().clone(),
            edges: network.edges().to_vec(),
            capacities: network
                .edges()
                .iter()
                .map(|edge| ((edge.from, edge.to), edge.capacity))
                .collect(),
            net: HashMap::new(),
        }
    }

    fn from_residual(network: &ValidatedNetwork<N>, graph: &ResidualGraph) -> Self {
        let mut assignment = Self::zero(network);
        for edge in network.edges() {
            for (from, to) in [(edge.from, edge.to), (edge.to, edge.from)] {
                assignment.net.insert((from, to), graph.net_flow(from, to));
            }
        }
        assignment
    }

    fn ids(&self, from: &N, to: &N) -> Option<(NodeId, NodeId)> {
        Some((self.index.id_of(from)?, self.index.id_of(to)?))
    }

    /// Signed flow on `from -> to`; `net_flow(u, v) == -net_flow(v, u)`
    pub fn net_flow(&self, from: &N, to: &N) -> Capacity {
        self.ids(from, to)
            .and_then(|key| self.net.get(&key).copied())
            .unwrap_or(0)
    }

    /// Flow carried by the input edge `from -> to` in its declared direction.
    ///
    /// 0 when no such edge was declared. With antiparallel input edges the
    /// net flow is attributed to whichever direction it runs in.
    pub fn flow(&self, from: &N, to: &N) -> Capacity {
        match self.capacity(from, to) {
            Some(_) => self.net_flow(from, to).max(0),
            None => 0,
        }
    }

    /// Summed original capacity of the input edge `from -> to`
    pub fn capacity(&self, from: &N, to: &N) -> Option<Capacity> {
        self.ids(from, to)
            .and_then(|key| self.capacities.get(&key).copied())
    }

    /// Every logical input edge with its flow, in first-declaration order
    pub fn edge_flows(&self) -> impl Iterator<Item = EdgeFlow<'_, N>> + '_ {
        self.edges.iter().map(move |edge| {
            let net = self.net.get(&(edge.from, edge.to)).copied().unwrap_or(0);
            EdgeFlow {
                from: self.index.label(edge.from),
                to: self.index.label(edge.to),
                capacity: edge.capacity,
                flow: net.max(0),
            }
        })
    }

    /// All node labels in ascending order
    pub fn nodes(&self) -> &[N] {
        self.index.labels()
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct MaxFlowResult<N: Ord> {
    source: N,
    sink: N,
    total_flow: Capacity,
    flows: FlowAssignment<N>,
    history: FlowHistory<N>,
    min_cut: Option<MinCut<N>>,
}

impl<N: NodeLabel> MaxFlowResult<N> {
    pub fn source(&self) -> &N {
        &self.source
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn total_flow(&self) -> Capacity {
        self.total_flow
    }

    /// Shorthand for [`FlowAssignment::flow`]
    pub fn flow(&self, from: &N, to: &N) -> Capacity {
        self.flows.flow(from, to)
    }

    /// Shorthand for [`FlowAssignment::net_flow`]
    pub fn net_flow(&self, from: &N, to: &N) -> Capacity {
        self.flows.net_flow(from, to)
    }

    pub fn flows(&self) -> &FlowAssignment<N> {
        &self.flows
    }

    pub fn history(&self) -> &FlowHistory<N> {
        &self.history
    }

    /// Minimum cut; `None` only when source and sink coincide
    pub fn min_cut(&self) -> Option<&MinCut<N>> {
        self.min_cut.as_ref()
    }
}

/// Edmonds-Karp maximum flow engine
#[derive(Debug, Clone, Default)]
pub struct FlowEngine {
    config: FlowConfig,
}

impl FlowEngine {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Computes the maximum flow from `source` to `sink`.
    ///
    /// Convenience form of [`MaxFlowAlgorithm::solve`] taking raw node and
    /// edge collections.
    pub fn run<N, I, E, T>(&self, nodes: I, edges: E, source: N, sink: N) -> Result<MaxFlowResult<N>, FlowError>
    where
        N: NodeLabel,
        I: IntoIterator<Item = N>,
        E: IntoIterator<Item = T>,
        T: Into<Edge<N>>,
    {
        self.solve(&FlowProblem::new(nodes, edges, source, sink))
    }

    /// Solves independent problems in parallel; results keep input order.
    pub fn run_batch<N: NodeLabel>(&self, problems: &[FlowProblem<N>]) -> Vec<Result<MaxFlowResult<N>, FlowError>> {
        problems.par_iter().map(|problem| self.solve(problem)).collect()
    }

    fn degenerate<N: NodeLabel>(&self, problem: &FlowProblem<N>, network: &ValidatedNetwork<N>) -> MaxFlowResult<N> {
        MaxFlowResult {
            source: problem.source().clone(),
            sink: problem.sink().clone(),
            total_flow: 0,
            flows: FlowAssignment::zero(network),
            history: FlowHistory::new(self.config.snapshot_mode, ResidualSnapshot::default()),
            min_cut: None,
        }
    }

    fn step_residual<N: NodeLabel>(
        &self,
        graph: &ResidualGraph,
        index: &NodeIndex<N>,
        path: &[ArcId],
    ) -> StepResidual<N> {
        match self.config.snapshot_mode {
            SnapshotMode::Full => StepResidual::Full(graph.snapshot(index)),
            SnapshotMode::Delta => StepResidual::Delta(graph.touched_entries(index, path)),
        }
    }
}

impl MaxFlowAlgorithm for FlowEngine {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::new("edmonds_karp")
    }

    fn name(&self) -> &'static str {
        "Edmonds-Karp"
    }

    fn complexity(&self) -> AlgorithmComplexity {
        AlgorithmComplexity {
            time_complexity: "O(V·E²)".to_string(),
            space_complexity: "O(V + E) per run, plus O(E) per recorded full snapshot".to_string(),
            iteration_bound: "O(V·E) augmentations".to_string(),
        }
    }

    fn solve_traced<N: NodeLabel>(
        &self,
        problem: &FlowProblem<N>,
        mut tracer: Option<&mut dyn TraceSink>,
        cancel: Option<&CancellationToken>,
    ) -> Result<MaxFlowResult<N>, FlowError> {
        let network = problem.validate()?;
        debug!(
            "edmonds-karp: {} nodes, {} logical edges, {} -> {}",
            network.node_count(),
            network.edges().len(),
            problem.source(),
            problem.sink()
        );

        if network.source() == network.sink() {
            debug!("edmonds-karp: source equals sink, no flow to route");
            return Ok(self.degenerate(problem, &network));
        }

        let index = network.index();
        let (source, sink) = (network.source(), network.sink());
        let mut graph = ResidualGraph::initialize(network.node_count(), network.edges());
        let mut history = FlowHistory::new(self.config.snapshot_mode, graph.snapshot(index));
        let mut finder = AugmentingPathFinder::new(network.node_count());
        let mut total: Capacity = 0;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                warn!(
                    "edmonds-karp: cancelled after {} augmentations, partial flow {}",
                    history.len(),
                    total
                );
                return Err(FlowError::Cancelled {
                    completed_steps: history.len(),
                    partial_flow: total,
                });
            }

            let found = finder.find(&graph, source, sink);
            trace!("edmonds-karp: bfs discovered {} nodes", finder.discovered());
            let Some(path) = found else {
                break;
            };

            if let Some(limit) = self.config.max_augmentations {
                if history.len() >= limit {
                    warn!("edmonds-karp: augmentation limit {} reached with paths remaining", limit);
                    return Err(FlowError::Cancelled {
                        completed_steps: history.len(),
                        partial_flow: total,
                    });
                }
            }

            let bottleneck = path
                .arcs()
                .iter()
                .map(|&arc| graph.residual_of(arc))
                .min()
                .ok_or_else(|| FlowError::Internal("augmenting path has no arcs".to_string()))?;

            graph.apply(path.arcs(), bottleneck)?;
            total = total
                .checked_add(bottleneck)
                .ok_or_else(|| FlowError::Internal("total flow overflows".to_string()))?;

            let step = history.len() + 1;
            let labels: Vec<N> = path.nodes().iter().map(|&node| index.label(node).clone()).collect();

            if self.config.log_steps {
                debug!(
                    "edmonds-karp: step {} pushed {} along {} arcs (cumulative {})",
                    step,
                    bottleneck,
                    path.len(),
                    total
                );
            }
            if let Some(trace_sink) = tracer.as_deref_mut() {
                trace_sink.record(&format_step_line(step, &labels, bottleneck, total));
            }

            let residual = self.step_residual(&graph, index, path.arcs());
            history.push(HistoryStep::new(step, labels, bottleneck, total, residual));
        }

        let terminal = graph.snapshot(index);
        let min_cut = MinCutExtractor::extract(index.labels(), &network.labelled_edges(), problem.source(), &terminal);
        debug!(
            "edmonds-karp: max flow {} after {} augmentations, cut capacity {}",
            total,
            history.len(),
            min_cut.capacity()
        );

        Ok(MaxFlowResult {
            source: problem.source().clone(),
            sink: problem.sink().clone(),
            total_flow: total,
            flows: FlowAssignment::from_residual(&network, &graph),
            history,
            min_cut: Some(min_cut),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use crate::execution::tracer::CollectingTraceSink;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn edges(list: &[(&'static str, &'static str, Capacity)]) -> Vec<Edge<&'static str>> {
        list.iter().map(|&(from, to, capacity)| Edge::new(from, to, capacity)).collect()
    }

    fn diamond() -> FlowProblem<&'static str> {
        FlowProblem::new(
            vec!["A", "B", "C", "D"],
            edges(&[("A", "B", 2), ("A", "C", 3), ("B", "D", 3), ("C", "D", 2)]),
            "A",
            "D",
        )
    }

    #[test]
    fn test_engine_metadata() {
        let engine = FlowEngine::default();
        assert_eq!(engine.name(), "Edmonds-Karp");
        assert_eq!(engine.id(), AlgorithmId::new("edmonds_karp"));
        assert_eq!(engine.complexity().time_complexity, "O(V·E²)");
    }

    #[test]
    fn test_single_edge() {
        init_logger();
        let result = FlowEngine::default()
            .run(vec!["A", "B"], edges(&[("A", "B", 5)]), "A", "B")
            .unwrap();

        assert_eq!(result.total_flow(), 5);
        assert_eq!(result.history().len(), 1);
        assert_eq!(result.history().steps()[0].bottleneck(), 5);
        assert_eq!(result.flow(&"A", &"B"), 5);
        assert_eq!(result.net_flow(&"B", &"A"), -5);
    }

    #[test]
    fn test_diamond_flow_and_cut() {
        init_logger();
        let result = FlowEngine::default().solve(&diamond()).unwrap();

        assert_eq!(result.total_flow(), 4);
        assert_eq!(result.flow(&"A", &"B"), 2);
        assert_eq!(result.flow(&"A", &"C"), 2);
        assert_eq!(result.flow(&"B", &"D"), 2);
        assert_eq!(result.flow(&"C", &"D"), 2);

        let cut = result.min_cut().unwrap();
        assert_eq!(cut.source_side().iter().copied().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(cut.sink_side().iter().copied().collect::<Vec<_>>(), vec!["B", "D"]);
        assert_eq!(cut.cut_edges(), &[Edge::new("A", "B", 2), Edge::new("C", "D", 2)]);
        assert_eq!(cut.capacity(), 4);
    }

    #[test]
    fn test_diamond_history_and_trace() {
        let mut sink = CollectingTraceSink::new();
        let result = FlowEngine::default()
            .solve_traced(&diamond(), Some(&mut sink), None)
            .unwrap();

        let history = result.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history.steps()[0].path(), &["A", "B", "D"]);
        assert_eq!(history.steps()[1].path(), &["A", "C", "D"]);
        assert_eq!(history.steps()[1].cumulative_flow(), 4);

        let after_first = history.steps()[0].snapshot().unwrap();
        assert_eq!(after_first.residual(&"A", &"B"), Some(0));
        assert_eq!(after_first.residual(&"B", &"A"), Some(2));
        assert_eq!(after_first.residual(&"A", &"C"), Some(3));

        assert_eq!(
            sink.lines(),
            &[
                "Step 1: path=A -> B -> D, bottleneck=2, cumulative=2".to_string(),
                "Step 2: path=A -> C -> D, bottleneck=2, cumulative=4".to_string(),
            ]
        );
    }

    #[test]
    fn test_trace_does_not_change_result() {
        let engine = FlowEngine::default();
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());
        let traced = engine.solve_traced(&diamond(), Some(&mut sink), None).unwrap();
        let plain = engine.solve(&diamond()).unwrap();

        assert_eq!(traced.total_flow(), plain.total_flow());
        assert_eq!(traced.history(), plain.history());
        assert_eq!(traced.flows(), plain.flows());
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_source_equals_sink() {
        let result = FlowEngine::default()
            .run(vec!["A", "B"], edges(&[("A", "B", 5)]), "A", "A")
            .unwrap();

        assert_eq!(result.total_flow(), 0);
        assert!(result.history().is_empty());
        assert!(result.min_cut().is_none());
        assert_eq!(result.flow(&"A", &"B"), 0);
    }

    #[test]
    fn test_unreachable_sink() {
        let result = FlowEngine::default()
            .run(vec!["A", "B", "C", "D"], edges(&[("A", "B", 3), ("C", "D", 4)]), "A", "D")
            .unwrap();

        assert_eq!(result.total_flow(), 0);
        assert!(result.history().is_empty());
        let cut = result.min_cut().unwrap();
        assert_eq!(cut.source_side().len(), 2);
        assert!(cut.source_side().contains(&"B"));
        assert!(cut.sink_side().contains(&"C"));
        assert_eq!(cut.capacity(), 0);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let engine = FlowEngine::default();

        let err = engine
            .run(vec!["A", "B"], edges(&[("A", "B", -2)]), "A", "B")
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(InputError::NegativeCapacity { .. })));

        let err = engine.run(vec!["A", "B"], edges(&[("A", "A", 2)]), "A", "B").unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(InputError::SelfLoop { .. })));

        let err = engine.run(vec!["A", "B"], edges(&[("A", "B", 2)]), "A", "Q").unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(InputError::UnknownTerminal { .. })));
    }

    #[test]
    fn test_invalid_input_rejected_even_when_source_equals_sink() {
        let err = FlowEngine::default()
            .run(vec!["A", "B"], edges(&[("B", "B", 1)]), "A", "A")
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(InputError::SelfLoop { .. })));
    }

    #[test]
    fn test_capacity_overflow_is_rejected_before_running() {
        let engine = FlowEngine::default();

        let err = engine
            .run(
                vec!["A", "B"],
                edges(&[("A", "B", Capacity::MAX), ("B", "A", Capacity::MAX)]),
                "A",
                "B",
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(InputError::CapacityOverflow { .. })));

        // two disjoint paths whose sum exceeds the capacity type
        let err = engine
            .run(
                vec!["S", "X", "Y", "T"],
                edges(&[
                    ("S", "X", Capacity::MAX),
                    ("S", "Y", Capacity::MAX),
                    ("X", "T", Capacity::MAX),
                    ("Y", "T", Capacity::MAX),
                ]),
                "S",
                "T",
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(InputError::CapacityOverflow { .. })));
    }

    #[test]
    fn test_extreme_capacity_without_overflow() {
        let result = FlowEngine::default()
            .run(
                vec!["S", "M", "T"],
                edges(&[("S", "M", Capacity::MAX), ("M", "S", 0), ("M", "T", Capacity::MAX)]),
                "S",
                "T",
            )
            .unwrap();
        assert_eq!(result.total_flow(), Capacity::MAX);
        assert_eq!(result.net_flow(&"M", &"S"), -Capacity::MAX);
    }

    #[test]
    fn test_parallel_and_antiparallel_edges() {
        let result = FlowEngine::default()
            .run(
                vec!["S", "M", "T"],
                edges(&[("S", "M", 2), ("S", "M", 3), ("M", "S", 4), ("M", "T", 10)]),
                "S",
                "T",
            )
            .unwrap();

        assert_eq!(result.total_flow(), 5);
        assert_eq!(result.flow(&"S", &"M"), 5);
        assert_eq!(result.flow(&"M", &"S"), 0);
        assert_eq!(result.flows().capacity(&"S", &"M"), Some(5));

        let flows: Vec<(&str, &str, Capacity)> = result
            .flows()
            .edge_flows()
            .map(|edge| (*edge.from, *edge.to, edge.flow))
            .collect();
        assert_eq!(flows, vec![("S", "M", 5), ("M", "S", 0), ("M", "T", 5)]);
    }

    #[test]
    fn test_second_path_undoes_flow_through_reverse_arc() {
        // S -> X -> Y -> T is the unique shortest path, but the maximum flow
        // routes S -> X -> P -> Q -> T and S -> R -> U -> Y -> T instead
        let result = FlowEngine::default()
            .run(
                vec!["S", "X", "Y", "T", "P", "Q", "R", "U"],
                edges(&[
                    ("S", "X", 1),
                    ("X", "Y", 1),
                    ("Y", "T", 1),
                    ("X", "P", 1),
                    ("P", "Q", 1),
                    ("Q", "T", 1),
                    ("S", "R", 1),
                    ("R", "U", 1),
                    ("U", "Y", 1),
                ]),
                "S",
                "T",
            )
            .unwrap();

        assert_eq!(result.total_flow(), 2);
        let steps = result.history().steps();
        assert_eq!(steps[0].path(), &["S", "X", "Y", "T"]);
        assert_eq!(steps[1].path(), &["S", "R", "U", "Y", "X", "P", "Q", "T"]);
        assert!(steps[1].edges().contains(&("Y", "X")));
        assert_eq!(result.flow(&"X", &"Y"), 0);
        assert_eq!(result.flow(&"U", &"Y"), 1);
        assert_eq!(result.min_cut().unwrap().capacity(), 2);
    }

    #[test]
    fn test_cancellation_before_first_iteration() {
        let token = CancellationToken::new();
        token.cancel();

        let err = FlowEngine::default()
            .solve_traced(&diamond(), None, Some(&token))
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::Cancelled {
                completed_steps: 0,
                partial_flow: 0
            }
        );
    }

    #[test]
    fn test_cancellation_between_iterations() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut sink = move |_: &str| trigger.cancel();

        let err = FlowEngine::default()
            .solve_traced(&diamond(), Some(&mut sink), Some(&token))
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::Cancelled {
                completed_steps: 1,
                partial_flow: 2
            }
        );
    }

    #[test]
    fn test_augmentation_limit() {
        let engine = FlowEngine::new(FlowConfig::default().with_max_augmentations(1));
        let err = engine.solve(&diamond()).unwrap_err();
        assert!(err.is_cancelled());

        let engine = FlowEngine::new(FlowConfig::default().with_max_augmentations(2));
        assert_eq!(engine.solve(&diamond()).unwrap().total_flow(), 4);
    }

    #[test]
    fn test_delta_mode_matches_full_mode() {
        let full = FlowEngine::default().solve(&diamond()).unwrap();
        let delta = FlowEngine::new(FlowConfig::default().with_snapshot_mode(SnapshotMode::Delta))
            .solve(&diamond())
            .unwrap();

        assert_eq!(delta.history().mode(), SnapshotMode::Delta);
        assert!(delta.history().steps()[0].snapshot().is_none());
        for step in 0..=full.history().len() {
            assert_eq!(
                full.history().residual_at(step).unwrap(),
                delta.history().residual_at(step).unwrap()
            );
        }
    }

    #[test]
    fn test_run_batch_keeps_order() {
        let problems = vec![
            diamond(),
            FlowProblem::new(vec!["A", "B"], edges(&[("A", "B", 5)]), "A", "B"),
            FlowProblem::new(vec!["A", "B"], edges(&[("A", "B", -1)]), "A", "B"),
        ];

        let results = FlowEngine::default().run_batch(&problems);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().total_flow(), 4);
        assert_eq!(results[1].as_ref().unwrap().total_flow(), 5);
        assert!(results[2].is_err());
    }

    #[test]
    fn test_integer_labels() {
        let result = FlowEngine::default()
            .run(
                0u32..4,
                vec![Edge::new(0u32, 1, 4), Edge::new(1, 3, 2), Edge::new(0, 2, 1), Edge::new(2, 3, 6)],
                0,
                3,
            )
            .unwrap();
        assert_eq!(result.total_flow(), 3);
        assert_eq!(result.history().steps()[0].path(), &[0, 1, 3]);
    }
}
