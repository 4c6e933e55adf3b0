use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::block::{Block, BlockIndex};
use crate::block_model::BlockModel;
use crate::mine_plan::{MinePlan, PeriodFilter};

/// Extracted rock for a plan period, or the signal that the period has no rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    Extracted {
        filter: PeriodFilter,
        /// Model tonnage of the scheduled blocks found in the model.
        tonnage: f64,
        /// Tonnage as written in the plan rows.
        plan_tonnage: f64,
        plan_rows: usize,
        matched_blocks: usize,
    },
    PeriodNotFound {
        filter: PeriodFilter,
    },
}

impl ExtractionOutcome {
    /// Zero when the period has no rows.
    pub fn tonnage(&self) -> f64 {
        match self {
            ExtractionOutcome::Extracted { tonnage, .. } => *tonnage,
            ExtractionOutcome::PeriodNotFound { .. } => 0.0,
        }
    }

    pub fn is_period_found(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted { .. })
    }
}

/// Sum the tonnage of model blocks scheduled by `plan` under `filter`.
///
/// Plan rows are joined on coordinates; a block listed twice counts once and
/// rows pointing outside the model are ignored.
pub fn extracted_tonnage(
    model: &BlockModel,
    plan: &MinePlan,
    filter: PeriodFilter,
) -> ExtractionOutcome {
    let mut plan_rows = 0;
    let mut plan_tonnage = 0.0;
    let mut seen = HashSet::new();
    let mut tonnage = 0.0;

    for entry in plan.filter(filter) {
        plan_rows += 1;
        plan_tonnage += entry.tonnage;
        if let Some(block) = model.get(&entry.ind) {
            if seen.insert(entry.ind) {
                tonnage += block.tonnage;
            }
        }
    }

    if plan_rows == 0 {
        warn!(?filter, "no mine plan rows for period");
        return ExtractionOutcome::PeriodNotFound { filter };
    }

    info!(
        ?filter,
        plan_rows,
        matched = seen.len(),
        tonnage,
        "extracted tonnage accounted"
    );

    ExtractionOutcome::Extracted {
        filter,
        tonnage,
        plan_tonnage,
        plan_rows,
        matched_blocks: seen.len(),
    }
}

/// Coordinates mined by the plan up to and including `period`.
pub fn mined_through(plan: &MinePlan, period: i64) -> HashSet<BlockIndex> {
    plan.filter(PeriodFilter::UpTo(period))
        .map(|entry| entry.ind)
        .collect()
}

/// Blocks still in the ground after `period`.
pub fn remaining_blocks<'a>(
    model: &'a BlockModel,
    plan: &MinePlan,
    period: i64,
) -> Vec<&'a Block> {
    let mined = mined_through(plan, period);
    model.iter().filter(|b| !mined.contains(&b.ind)).collect()
}
