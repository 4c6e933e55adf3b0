//! Ultimate pit limit engine for open-pit block models.
//!
//! Pipeline: [`block_model`] loads and values blocks under a
//! [`valuation::PricingConfig`], [`rock_type`] optionally labels them,
//! [`pit_graph`] turns the model into a flow network, [`flow`] solves the
//! minimum cut and [`optimizer`] reads the pit off it. [`analytics`] and
//! [`report`] produce the numbers a dashboard plots.

pub mod analytics;
pub mod block;
pub mod block_model;
pub mod config;
pub mod error;
pub mod flow;
pub mod logging;
pub mod mine_plan;
pub mod optimizer;
pub mod pipeline;
pub mod pit_graph;
pub mod report;
pub mod rock_type;
pub mod valuation;

pub use block::{Block, BlockIndex, BlockInterface, BlockRecord, RockType};
pub use block_model::BlockModel;
pub use config::AppConfig;
pub use error::{Result, UplError};
pub use mine_plan::{MinePlan, MinePlanEntry, PeriodFilter};
pub use optimizer::{OptimizeParams, Optimizer, UplOutcome, UplResult};
pub use pipeline::{run_scenario, ScenarioInputs, ScenarioRun};
pub use pit_graph::PrecedenceMode;
pub use report::ScenarioReport;
pub use valuation::PricingConfig;
