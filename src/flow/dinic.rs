use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::network::{EdgeId, FlowNetwork, NodeId};
use crate::error::{Result, UplError};

/// Residual capacity below this share of the flow bound counts as saturated.
const RELATIVE_EPSILON: f64 = 1e-12;

const UNREACHED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverLimits {
    /// Wall clock budget, checked between phases.
    pub time_limit: Option<Duration>,
}

/// Maximum flow together with the minimum cut that certifies it.
#[derive(Debug, Clone, PartialEq)]
pub struct CutResult {
    pub max_flow: f64,
    /// `true` for nodes reachable from the source in the final residual graph.
    pub source_side: Vec<bool>,
    pub phases: usize,
    pub augmenting_paths: usize,
}

impl CutResult {
    pub fn source_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.source_side
            .iter()
            .enumerate()
            .filter(|(_, inside)| **inside)
            .map(|(node, _)| node)
    }

    pub fn cut_edges<'a>(&'a self, network: &'a FlowNetwork) -> impl Iterator<Item = EdgeId> + 'a {
        network.cut_edges(&self.source_side)
    }

    pub fn cut_capacity(&self, network: &FlowNetwork) -> f64 {
        network.cut_capacity(&self.source_side)
    }
}

/// Dinic's max-flow / min-cut solver.
///
/// Each phase builds a BFS level graph from the source and saturates it with a
/// blocking flow found by DFS with per-node arc pointers; `O(V^2 E)` overall.
/// Arcs are scanned in edge insertion order, so the same network always yields
/// the same flow and the same partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DinicSolver {
    limits: SolverLimits,
}

struct Residual {
    //arc 2e is edge e forward, arc 2e + 1 its reverse
    head: Vec<NodeId>,
    capacity: Vec<f64>,
    outgoing: Vec<Vec<usize>>,
}

impl Residual {
    fn new(network: &FlowNetwork) -> Self {
        let arcs = network.num_edges() * 2;
        let mut head = Vec::with_capacity(arcs);
        let mut capacity = Vec::with_capacity(arcs);
        let mut outgoing = vec![Vec::new(); network.num_nodes()];

        for (id, edge) in network.edges().iter().enumerate() {
            head.push(edge.to);
            capacity.push(edge.capacity);
            head.push(edge.from);
            capacity.push(0.0);
            outgoing[edge.from].push(2 * id);
            outgoing[edge.to].push(2 * id + 1);
        }

        Self {
            head,
            capacity,
            outgoing,
        }
    }
}

struct Phase<'a> {
    residual: &'a mut Residual,
    level: &'a [usize],
    next_arc: Vec<usize>,
    sink: NodeId,
    epsilon: f64,
}

impl Phase<'_> {
    fn push(&mut self, node: NodeId, limit: f64) -> f64 {
        if node == self.sink {
            return limit;
        }
        while self.next_arc[node] < self.residual.outgoing[node].len() {
            let arc = self.residual.outgoing[node][self.next_arc[node]];
            let to = self.residual.head[arc];
            let available = self.residual.capacity[arc];
            if available > self.epsilon && self.level[to] == self.level[node] + 1 {
                let pushed = self.push(to, limit.min(available));
                if pushed > 0.0 {
                    self.residual.capacity[arc] -= pushed;
                    self.residual.capacity[arc ^ 1] += pushed;
                    return pushed;
                }
            }
            self.next_arc[node] += 1;
        }
        0.0
    }
}

impl DinicSolver {
    pub fn new(limits: SolverLimits) -> Self {
        Self { limits }
    }

    pub fn solve(&self, network: &FlowNetwork) -> Result<CutResult> {
        network.validate()?;

        let started = Instant::now();
        let source = network.source();
        let sink = network.sink();
        let source_out: f64 = network
            .edges()
            .iter()
            .filter(|e| e.from == source)
            .map(|e| e.capacity)
            .sum();
        let epsilon = saturation_tolerance(network, source_out);

        let mut residual = Residual::new(network);
        let mut max_flow = 0.0;
        let mut phases = 0;
        let mut augmenting_paths = 0;

        loop {
            let level = levels(&residual, source, epsilon);
            if level[sink] == UNREACHED {
                break;
            }
            if let Some(limit) = self.limits.time_limit {
                if started.elapsed() >= limit {
                    return Err(UplError::aborted(format!(
                        "max flow exceeded {:?} after {} phases",
                        limit, phases
                    )));
                }
            }
            phases += 1;

            let mut phase = Phase {
                residual: &mut residual,
                level: &level,
                next_arc: vec![0; network.num_nodes()],
                sink,
                epsilon,
            };
            let mut phase_flow = 0.0;
            loop {
                let pushed = phase.push(source, source_out);
                if pushed <= 0.0 {
                    break;
                }
                phase_flow += pushed;
                augmenting_paths += 1;
            }
            debug!(phase = phases, phase_flow, "dinic phase complete");
            max_flow += phase_flow;
        }

        let source_side = levels(&residual, source, epsilon)
            .into_iter()
            .map(|l| l != UNREACHED)
            .collect();

        debug!(max_flow, phases, augmenting_paths, "max flow solved");

        Ok(CutResult {
            max_flow,
            source_side,
            phases,
            augmenting_paths,
        })
    }
}

/// Tolerance scaled by the flow bound rather than the total capacity, which
/// precedence edges inflate, and capped at half the smallest positive capacity
/// so no real arc ever reads as saturated.
fn saturation_tolerance(network: &FlowNetwork, flow_bound: f64) -> f64 {
    let smallest = network
        .edges()
        .iter()
        .map(|e| e.capacity)
        .filter(|c| *c > 0.0)
        .fold(f64::INFINITY, f64::min);
    (flow_bound * RELATIVE_EPSILON).min(smallest / 2.0)
}

fn levels(residual: &Residual, source: NodeId, epsilon: f64) -> Vec<usize> {
    let mut level = vec![UNREACHED; residual.outgoing.len()];
    let mut queue = VecDeque::new();
    level[source] = 0;
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        for &arc in &residual.outgoing[node] {
            let to = residual.head[arc];
            if level[to] == UNREACHED && residual.capacity[arc] > epsilon {
                level[to] = level[node] + 1;
                queue.push_back(to);
            }
        }
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(net: &FlowNetwork) -> CutResult {
        DinicSolver::default().solve(net).unwrap()
    }

    #[test]
    fn textbook_network() {
        // CLRS figure 26.1, max flow 23
        let mut net = FlowNetwork::new(6, 0, 5).unwrap();
        for (u, v, c) in [
            (0, 1, 16.0),
            (0, 2, 13.0),
            (1, 3, 12.0),
            (2, 1, 4.0),
            (2, 4, 14.0),
            (3, 2, 9.0),
            (3, 5, 20.0),
            (4, 3, 7.0),
            (4, 5, 4.0),
        ] {
            net.add_edge(u, v, c).unwrap();
        }
        let cut = solve(&net);
        assert_eq!(cut.max_flow, 23.0);
        assert_eq!(cut.cut_capacity(&net), 23.0);
        assert!(cut.source_side[0]);
        assert!(!cut.source_side[5]);
    }

    #[test]
    fn unreachable_sink_gives_zero_flow() {
        let mut net = FlowNetwork::new(4, 0, 3).unwrap();
        net.add_edge(0, 1, 5.0).unwrap();
        net.add_edge(2, 3, 5.0).unwrap();
        let cut = solve(&net);
        assert_eq!(cut.max_flow, 0.0);
        assert_eq!(cut.source_nodes().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(cut.phases, 0);
    }

    #[test]
    fn isolated_source_is_not_an_error() {
        let net = FlowNetwork::new(2, 0, 1).unwrap();
        let cut = solve(&net);
        assert_eq!(cut.max_flow, 0.0);
        assert_eq!(cut.source_side, vec![true, false]);
    }

    #[test]
    fn repeated_solves_are_identical() {
        let mut net = FlowNetwork::new(5, 0, 4).unwrap();
        for (u, v, c) in [
            (0, 1, 1.5),
            (0, 2, 2.25),
            (1, 2, 0.75),
            (1, 3, 1.0),
            (2, 3, 1.0),
            (2, 4, 1.0),
            (3, 4, 3.0),
        ] {
            net.add_edge(u, v, c).unwrap();
        }
        let first = solve(&net);
        let second = solve(&net);
        assert_eq!(first.max_flow.to_bits(), second.max_flow.to_bits());
        assert_eq!(first.source_side, second.source_side);
    }

    #[test]
    fn huge_middle_edges_do_not_hide_small_ones() {
        let mut net = FlowNetwork::new(4, 0, 3).unwrap();
        net.add_edge(0, 1, 1.0).unwrap();
        for _ in 0..100 {
            net.add_edge(1, 2, 1e15).unwrap();
        }
        net.add_edge(2, 3, 1.0).unwrap();
        let cut = solve(&net);
        assert_eq!(cut.max_flow, 1.0);
        assert_eq!(cut.cut_capacity(&net), 1.0);
    }

    #[test]
    fn tolerance_stays_under_the_smallest_capacity() {
        let mut net = FlowNetwork::new(3, 0, 2).unwrap();
        net.add_edge(0, 1, 1e9).unwrap();
        net.add_edge(1, 2, 1e-6).unwrap();
        assert!(saturation_tolerance(&net, 1e9) < 1e-6);

        let cut = solve(&net);
        assert_eq!(cut.max_flow, 1e-6);
        assert_eq!(cut.source_side, vec![true, true, false]);
    }

    #[test]
    fn zero_time_limit_aborts() {
        let mut net = FlowNetwork::new(3, 0, 2).unwrap();
        net.add_edge(0, 1, 1.0).unwrap();
        net.add_edge(1, 2, 1.0).unwrap();
        let solver = DinicSolver::new(SolverLimits {
            time_limit: Some(Duration::ZERO),
        });
        let err = solver.solve(&net).unwrap_err();
        assert!(matches!(err, UplError::ComputationAborted(_)));
    }
}
