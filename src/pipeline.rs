//! One batch run: load, value, classify, optimise, account, report.

use std::path::PathBuf;

use tracing::info;

use crate::analytics::{extracted_tonnage, ExtractionOutcome};
use crate::block_model::BlockModel;
use crate::config::AppConfig;
use crate::error::Result;
use crate::mine_plan::{MinePlan, PeriodFilter};
use crate::optimizer::{Optimizer, UplOutcome};
use crate::report::ScenarioReport;
use crate::rock_type::RockTypeClassifier;

/// Input files of a single scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioInputs {
    pub blocks: PathBuf,
    pub mine_plan: Option<PathBuf>,
    pub rock_type_rules: Option<PathBuf>,
    /// Ignored without a mine plan.
    pub period: Option<PeriodFilter>,
}

/// Everything one run produces, before rounding.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub model: BlockModel,
    pub outcome: UplOutcome,
    pub plan: Option<MinePlan>,
    pub extraction: Option<ExtractionOutcome>,
}

impl ScenarioRun {
    pub fn report(&self, config: &AppConfig) -> Result<ScenarioReport> {
        ScenarioReport::build(&self.model, &self.outcome, self.extraction.as_ref(), config)
    }
}

pub fn run_scenario(inputs: &ScenarioInputs, config: &AppConfig) -> Result<ScenarioRun> {
    config.validate()?;

    let mut model = BlockModel::load(&inputs.blocks, &config.pricing)?;
    if let Some(rules) = &inputs.rock_type_rules {
        let classifier = RockTypeClassifier::load(rules, config.baseline_rock_type())?;
        model = model.with_rock_types(&classifier);
    }

    let outcome = Optimizer::new(config.optimize_params()).optimize(&model)?;

    let plan = inputs
        .mine_plan
        .as_ref()
        .map(MinePlan::load)
        .transpose()?;
    let extraction = match (&plan, inputs.period) {
        (Some(plan), Some(filter)) => Some(extracted_tonnage(&model, plan, filter)),
        _ => None,
    };

    info!(
        model = %model.name,
        profitable = outcome.is_profitable(),
        extracted = ?extraction.as_ref().map(ExtractionOutcome::tonnage),
        "scenario complete"
    );

    Ok(ScenarioRun {
        model,
        outcome,
        plan,
        extraction,
    })
}
