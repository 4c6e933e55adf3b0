use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::block::{Block, BlockIndex};
use crate::block_model::BlockModel;
use crate::error::Result;
use crate::flow::{DinicSolver, SolverLimits};
use crate::pit_graph::{build_pit_network, NetworkSummary, PrecedenceMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeParams {
    pub precedence: PrecedenceMode,
    pub time_limit: Option<Duration>,
}

/// Blocks inside the ultimate pit and the cut that proves it optimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplResult {
    /// Sorted by coordinate.
    pub blocks: Vec<BlockIndex>,
    pub max_flow: f64,
    pub total_value: f64,
    pub total_tonnage: f64,
    pub network: NetworkSummary,
}

impl UplResult {
    pub fn contains(&self, ind: &BlockIndex) -> bool {
        self.blocks.binary_search(ind).is_ok()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The pit's blocks as stored in `model`.
    pub fn blocks_in<'a>(&'a self, model: &'a BlockModel) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter_map(move |ind| model.get(ind))
    }
}

/// Outcome of a pit limit run. An empty pit is a valid answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UplOutcome {
    Pit(UplResult),
    NoProfitableBlocks { max_flow: f64, network: NetworkSummary },
}

impl UplOutcome {
    pub fn pit(&self) -> Option<&UplResult> {
        match self {
            UplOutcome::Pit(result) => Some(result),
            UplOutcome::NoProfitableBlocks { .. } => None,
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.pit().is_some()
    }

    pub fn max_flow(&self) -> f64 {
        match self {
            UplOutcome::Pit(result) => result.max_flow,
            UplOutcome::NoProfitableBlocks { max_flow, .. } => *max_flow,
        }
    }

    pub fn total_value(&self) -> f64 {
        self.pit().map_or(0.0, |r| r.total_value)
    }
}

/// Ultimate pit limit via min cut.
#[derive(Debug, Clone, Copy, Default)]
pub struct Optimizer {
    pub params: OptimizeParams,
}

impl Optimizer {
    pub fn new(params: OptimizeParams) -> Self {
        Self { params }
    }

    pub fn optimize(&self, model: &BlockModel) -> Result<UplOutcome> {
        let pit = build_pit_network(model, self.params.precedence)?;
        let solver = DinicSolver::new(SolverLimits {
            time_limit: self.params.time_limit,
        });
        let cut = solver.solve(&pit.network)?;

        let mut blocks = Vec::new();
        let mut total_value = 0.0;
        let mut total_tonnage = 0.0;
        for node in cut.source_nodes() {
            if let Some(slot) = pit.slot(node) {
                let block = model.block_at(slot);
                blocks.push(block.ind);
                total_value += block.economic_value;
                total_tonnage += block.tonnage;
            }
        }

        if blocks.is_empty() || total_value <= 0.0 {
            warn!(model = %model.name, "no profitable pit");
            return Ok(UplOutcome::NoProfitableBlocks {
                max_flow: cut.max_flow,
                network: pit.summary,
            });
        }

        //slots are in coordinate order already
        info!(
            model = %model.name,
            blocks = blocks.len(),
            total_value,
            max_flow = cut.max_flow,
            "ultimate pit computed"
        );

        Ok(UplOutcome::Pit(UplResult {
            blocks,
            max_flow: cut.max_flow,
            total_value,
            total_tonnage,
            network: pit.summary,
        }))
    }
}
