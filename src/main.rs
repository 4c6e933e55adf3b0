use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use upl_engine::config::AppConfig;
use upl_engine::logging;
use upl_engine::mine_plan::PeriodFilter;
use upl_engine::pipeline::{run_scenario, ScenarioInputs};
use upl_engine::pit_graph::PrecedenceMode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Precedence {
    Column,
    Overlying,
}

impl From<Precedence> for PrecedenceMode {
    fn from(value: Precedence) -> Self {
        match value {
            Precedence::Column => PrecedenceMode::Column,
            Precedence::Overlying => PrecedenceMode::Overlying,
        }
    }
}

/// Compute the ultimate pit limit of a block model and print a JSON report.
#[derive(Debug, Parser)]
#[command(name = "upl", version)]
struct Args {
    /// Header-less block file: X,Y,Z,Tonnage,Metal1,Metal2
    #[arg(long)]
    blocks: PathBuf,

    /// Mine plan with header XIndex,YIndex,ZIndex,Period,Tonnage
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Plan period to account extracted tonnage for
    #[arg(long, requires = "plan")]
    period: Option<i64>,

    /// Count every period up to and including --period
    #[arg(long, requires = "period")]
    up_to: bool,

    /// Rock type rule file
    #[arg(long)]
    rules: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    metal_price: Option<f64>,

    #[arg(long)]
    metal_recovery: Option<f64>,

    #[arg(long)]
    mining_cost: Option<f64>,

    #[arg(long)]
    processing_cost: Option<f64>,

    #[arg(long, value_enum)]
    precedence: Option<Precedence>,
}

impl Args {
    fn config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(v) = self.metal_price {
            config.pricing.metal_price = v;
        }
        if let Some(v) = self.metal_recovery {
            config.pricing.metal_recovery = v;
        }
        if let Some(v) = self.mining_cost {
            config.pricing.mining_cost = v;
        }
        if let Some(v) = self.processing_cost {
            config.pricing.processing_cost = v;
        }
        if let Some(p) = self.precedence {
            config.solver.precedence = p.into();
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn inputs(&self) -> ScenarioInputs {
        let period = self.period.map(|p| {
            if self.up_to {
                PeriodFilter::UpTo(p)
            } else {
                PeriodFilter::At(p)
            }
        });
        ScenarioInputs {
            blocks: self.blocks.clone(),
            mine_plan: self.plan.clone(),
            rock_type_rules: self.rules.clone(),
            period,
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let config = args.config()?;
    let run = run_scenario(&args.inputs(), &config)
        .with_context(|| format!("running scenario {}", args.blocks.display()))?;
    let report = run.report(&config)?;

    println!("{}", report.to_json()?);
    Ok(())
}
