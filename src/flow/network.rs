use serde::{Deserialize, Serialize};

use crate::error::{Result, UplError};

pub type NodeId = usize;
pub type EdgeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub capacity: f64,
}

/// Directed capacitated graph with a designated source and sink.
///
/// Nodes are dense ids `0..num_nodes`. Edges keep their insertion order,
/// which is also the order the solver scans them in.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    num_nodes: usize,
    source: NodeId,
    sink: NodeId,
    edges: Vec<FlowEdge>,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize, source: NodeId, sink: NodeId) -> Result<Self> {
        let network = Self {
            num_nodes,
            source,
            sink,
            edges: Vec::new(),
        };
        network.check_terminals()?;
        Ok(network)
    }

    pub fn with_capacity(
        num_nodes: usize,
        source: NodeId,
        sink: NodeId,
        edge_capacity: usize,
    ) -> Result<Self> {
        let mut network = Self::new(num_nodes, source, sink)?;
        network.edges.reserve(edge_capacity);
        Ok(network)
    }

    fn check_terminals(&self) -> Result<()> {
        if self.source >= self.num_nodes || self.sink >= self.num_nodes {
            return Err(UplError::invalid_graph(format!(
                "source {} or sink {} missing from a network of {} nodes",
                self.source, self.sink, self.num_nodes
            )));
        }
        if self.source == self.sink {
            return Err(UplError::invalid_graph("source and sink are the same node"));
        }
        Ok(())
    }

    fn check_edge(&self, edge: &FlowEdge) -> Result<()> {
        if edge.from >= self.num_nodes || edge.to >= self.num_nodes {
            return Err(UplError::invalid_graph(format!(
                "edge {} -> {} references a node outside 0..{}",
                edge.from, edge.to, self.num_nodes
            )));
        }
        if !edge.capacity.is_finite() || edge.capacity < 0.0 {
            return Err(UplError::invalid_graph(format!(
                "edge {} -> {} has invalid capacity {}",
                edge.from, edge.to, edge.capacity
            )));
        }
        Ok(())
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, capacity: f64) -> Result<EdgeId> {
        let edge = FlowEdge { from, to, capacity };
        self.check_edge(&edge)?;
        self.edges.push(edge);
        Ok(self.edges.len() - 1)
    }

    /// Re-check every edge and both terminals.
    pub fn validate(&self) -> Result<()> {
        self.check_terminals()?;
        self.edges.iter().try_for_each(|edge| self.check_edge(edge))
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    /// Capacity leaving `source_side` for the rest of the graph.
    pub fn cut_capacity(&self, source_side: &[bool]) -> f64 {
        self.cut_edges(source_side)
            .map(|id| self.edges[id].capacity)
            .sum()
    }

    pub fn cut_edges<'a>(&'a self, source_side: &'a [bool]) -> impl Iterator<Item = EdgeId> + 'a {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| source_side[e.from] && !source_side[e.to])
            .map(|(id, _)| id)
    }
}
