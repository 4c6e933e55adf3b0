//! Pit limit flow network.
//!
//! Every block is a node. Positive blocks hang off SOURCE with their value as
//! capacity, negative blocks drain into SINK with their cost as capacity, and
//! vertical neighbours are tied together with edges no finite cut can afford.
//! The source side of the minimum cut is then the most valuable pit.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block_model::BlockModel;
use crate::error::Result;
use crate::flow::{FlowNetwork, NodeId};

/// How vertical neighbours constrain each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecedenceMode {
    /// Unbounded edges both ways between `z` and `z + 1`: a connected column
    /// is taken as a whole.
    #[default]
    Column,
    /// Unbounded edge from a block to the one above it only: a block needs its
    /// overlying block removed first.
    Overlying,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub edges: usize,
    pub source_edges: usize,
    pub sink_edges: usize,
    pub precedence_edges: usize,
    /// Elevation of the shallowest bench, `None` for an empty model.
    pub surface_elevation: Option<i64>,
    /// Sum of every finite capacity in the network.
    pub finite_capacity: f64,
    /// Capacity used for precedence edges.
    pub unbounded_capacity: f64,
}

/// Flow network over a block model. Node `i` is arena slot `i`.
#[derive(Debug, Clone)]
pub struct PitNetwork {
    pub network: FlowNetwork,
    pub summary: NetworkSummary,
}

impl PitNetwork {
    pub fn source(&self) -> NodeId {
        self.network.source()
    }

    pub fn sink(&self) -> NodeId {
        self.network.sink()
    }

    /// Arena slot of a block node, `None` for the terminals.
    pub fn slot(&self, node: NodeId) -> Option<usize> {
        if node < self.network.num_nodes() - 2 {
            Some(node)
        } else {
            None
        }
    }
}

/// Capacity strictly larger than any finite cut of the network.
pub fn unbounded_capacity(finite_capacity: f64) -> f64 {
    2.0 * finite_capacity + 1.0
}

pub fn build_pit_network(model: &BlockModel, mode: PrecedenceMode) -> Result<PitNetwork> {
    let n = model.len();
    let source = n;
    let sink = n + 1;

    let finite_capacity: f64 = model.iter().map(|b| b.economic_value.abs()).sum();
    let unbounded = unbounded_capacity(finite_capacity);

    let mut network = FlowNetwork::with_capacity(n + 2, source, sink, n * 3)?;
    let mut summary = NetworkSummary {
        nodes: n + 2,
        surface_elevation: model.surface_elevation(),
        finite_capacity,
        unbounded_capacity: unbounded,
        ..Default::default()
    };

    for (slot, block) in model.iter().enumerate() {
        let value = block.economic_value;
        if value > 0.0 {
            network.add_edge(source, slot, value)?;
            summary.source_edges += 1;
        } else if value < 0.0 {
            network.add_edge(slot, sink, -value)?;
            summary.sink_edges += 1;
        }

        if let Some(above) = model.slot(&block.ind.above()) {
            network.add_edge(slot, above, unbounded)?;
            summary.precedence_edges += 1;
            if mode == PrecedenceMode::Column {
                network.add_edge(above, slot, unbounded)?;
                summary.precedence_edges += 1;
            }
        }
    }

    summary.edges = network.num_edges();
    debug!(?mode, surface = ?summary.surface_elevation, "precedence built");
    info!(
        nodes = summary.nodes,
        edges = summary.edges,
        source_edges = summary.source_edges,
        sink_edges = summary.sink_edges,
        "pit network built"
    );

    Ok(PitNetwork { network, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockIndex, BlockRecord};
    use crate::valuation::PricingConfig;

    fn model(records: &[(i64, i64, i64, f64, f64)]) -> BlockModel {
        let records: Vec<_> = records
            .iter()
            .map(|&(x, y, z, t, m)| BlockRecord::new(BlockIndex::new(x, y, z), t, m, 0.0))
            .collect();
        BlockModel::from_records("t", &records, &PricingConfig::default()).unwrap()
    }

    #[test]
    fn terminal_edges_follow_value_sign() {
        let m = model(&[(0, 0, 0, 10.0, 2.0), (5, 5, 0, 10.0, 0.0)]);
        let pit = build_pit_network(&m, PrecedenceMode::Column).unwrap();
        assert_eq!(pit.summary.source_edges, 1);
        assert_eq!(pit.summary.sink_edges, 1);
        assert_eq!(pit.summary.precedence_edges, 0);

        let edges = pit.network.edges();
        assert_eq!(edges[0].from, pit.source());
        assert!((edges[0].capacity - 169_925.0).abs() < 1e-6);
        assert_eq!(edges[1].to, pit.sink());
        assert_eq!(edges[1].capacity, 25.0);
    }

    #[test]
    fn column_mode_links_both_ways() {
        let m = model(&[(0, 0, 0, 10.0, 2.0), (0, 0, -1, 10.0, 0.0), (0, 0, -3, 10.0, 0.0)]);
        let pit = build_pit_network(&m, PrecedenceMode::Column).unwrap();
        // -3 has no neighbour at -2
        assert_eq!(pit.summary.precedence_edges, 2);

        let overlying = build_pit_network(&m, PrecedenceMode::Overlying).unwrap();
        assert_eq!(overlying.summary.precedence_edges, 1);
        let deep = m.slot(&BlockIndex::new(0, 0, -1)).unwrap();
        let top = m.slot(&BlockIndex::new(0, 0, 0)).unwrap();
        assert!(overlying
            .network
            .edges()
            .iter()
            .any(|e| e.from == deep && e.to == top));
    }

    #[test]
    fn precedence_capacity_exceeds_finite_total() {
        let m = model(&[(0, 0, 0, 10.0, 2.0), (0, 0, -1, 10.0, 0.0), (1, 0, 0, 4.0, 0.0)]);
        let pit = build_pit_network(&m, PrecedenceMode::Column).unwrap();
        let finite: f64 = pit
            .network
            .edges()
            .iter()
            .filter(|e| e.from == pit.source() || e.to == pit.sink())
            .map(|e| e.capacity)
            .sum();
        assert!(pit.summary.unbounded_capacity > finite);
        assert!(pit.summary.unbounded_capacity.is_finite());
        assert_eq!(pit.summary.surface_elevation, Some(0));
    }

    #[test]
    fn empty_model_builds_terminals_only() {
        let m = model(&[]);
        let pit = build_pit_network(&m, PrecedenceMode::Column).unwrap();
        assert_eq!(pit.network.num_nodes(), 2);
        assert_eq!(pit.network.num_edges(), 0);
        assert_eq!(pit.slot(0), None);
    }
}
