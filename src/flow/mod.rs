//! Capacitated flow networks and the min-cut solver.

mod dinic;
mod network;

pub use dinic::{CutResult, DinicSolver, SolverLimits};
pub use network::{EdgeId, FlowEdge, FlowNetwork, NodeId};
