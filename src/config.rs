//! Run configuration.
//!
//! Loaded from a TOML file; every section and key is optional:
//!
//! ```toml
//! [pricing]
//! metal_price = 1000000.0
//! metal_recovery = 0.85
//! mining_cost = 2.5
//! processing_cost = 5.0
//!
//! [analytics]
//! curve_step = 0.01
//! histogram_bins = 20
//!
//! [solver]
//! precedence = "column"   # or "overlying"
//! time_limit_ms = 60000
//!
//! [rock_types]
//! baseline = "undefined"
//!
//! [report]
//! precision = 3
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analytics::{DEFAULT_CURVE_STEP, DEFAULT_HISTOGRAM_BINS};
use crate::block::RockType;
use crate::error::{Result, UplError};
use crate::optimizer::OptimizeParams;
use crate::pit_graph::PrecedenceMode;
use crate::report::DEFAULT_PRECISION;
use crate::rock_type::DEFAULT_BASELINE;
use crate::valuation::PricingConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub analytics: AnalyticsConfig,
    pub solver: SolverConfig,
    pub rock_types: RockTypeConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub curve_step: f64,
    pub histogram_bins: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            curve_step: DEFAULT_CURVE_STEP,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub precedence: PrecedenceMode,
    /// No limit when absent.
    pub time_limit_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RockTypeConfig {
    pub baseline: String,
}

impl Default for RockTypeConfig {
    fn default() -> Self {
        Self {
            baseline: DEFAULT_BASELINE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Decimal places kept in reported numbers.
    pub precision: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            UplError::config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.pricing
            .validate()
            .map_err(|e| UplError::config(format!("[pricing] {}", e)))?;
        if !self.analytics.curve_step.is_finite() || self.analytics.curve_step <= 0.0 {
            return Err(UplError::config(format!(
                "[analytics] curve_step must be positive, got {}",
                self.analytics.curve_step
            )));
        }
        if self.analytics.histogram_bins == 0 {
            return Err(UplError::config("[analytics] histogram_bins must be at least 1"));
        }
        if self.rock_types.baseline.trim().is_empty() {
            return Err(UplError::config("[rock_types] baseline must not be empty"));
        }
        if self.report.precision > 12 {
            return Err(UplError::config(format!(
                "[report] precision must be at most 12, got {}",
                self.report.precision
            )));
        }
        Ok(())
    }

    pub fn optimize_params(&self) -> OptimizeParams {
        OptimizeParams {
            precedence: self.solver.precedence,
            time_limit: self.solver.time_limit_ms.map(Duration::from_millis),
        }
    }

    pub fn baseline_rock_type(&self) -> RockType {
        RockType::new(self.rock_types.baseline.trim())
    }
}
