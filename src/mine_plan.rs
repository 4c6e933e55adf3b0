use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::block::{BlockIndex, MAX_GRID_INDEX};
use crate::error::{Result, UplError};

/// One scheduled block of an external mine plan. `ind.z` is already elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinePlanEntry {
    pub ind: BlockIndex,
    pub period: i64,
    pub tonnage: f64,
}

/// Which plan rows count for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodFilter {
    /// Rows scheduled exactly in the period.
    At(i64),
    /// Rows scheduled in the period or any earlier one.
    UpTo(i64),
}

impl PeriodFilter {
    pub fn period(&self) -> i64 {
        match self {
            PeriodFilter::At(p) | PeriodFilter::UpTo(p) => *p,
        }
    }

    pub fn accepts(&self, period: i64) -> bool {
        match self {
            PeriodFilter::At(p) => period == *p,
            PeriodFilter::UpTo(p) => period <= *p,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanRow {
    #[serde(rename = "XIndex")]
    x_index: f64,
    #[serde(rename = "YIndex")]
    y_index: f64,
    #[serde(rename = "ZIndex")]
    z_index: f64,
    #[serde(rename = "Period")]
    period: f64,
    #[serde(rename = "Tonnage")]
    tonnage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinePlan {
    entries: Vec<MinePlanEntry>,
}

impl MinePlan {
    pub fn new(entries: Vec<MinePlanEntry>) -> Self {
        Self { entries }
    }

    /// Read a headed `XIndex,YIndex,ZIndex,Period,Tonnage` file; `ZIndex` is negated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            UplError::invalid_input(format!(
                "failed to open mine plan '{}': {}",
                path.display(),
                e
            ))
        })?;
        let plan = Self::parse(file)?;
        info!(
            rows = plan.len(),
            periods = plan.periods().len(),
            "loaded mine plan"
        );
        Ok(plan)
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (row_idx, result) in reader.deserialize::<PlanRow>().enumerate() {
            let row_number = row_idx + 2;
            let row = result.map_err(|e| {
                UplError::invalid_input(format!("mine plan row {}: {}", row_number, e))
            })?;

            let x = integral(row.x_index, "XIndex", row_number)?;
            let y = integral(row.y_index, "YIndex", row_number)?;
            let depth = integral(row.z_index, "ZIndex", row_number)?;
            let period = integral(row.period, "Period", row_number)?;
            if !row.tonnage.is_finite() {
                return Err(UplError::invalid_input(format!(
                    "mine plan row {}: Tonnage is not finite",
                    row_number
                )));
            }

            entries.push(MinePlanEntry {
                ind: BlockIndex::from_depth(x, y, depth),
                period,
                tonnage: row.tonnage,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MinePlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn periods(&self) -> BTreeSet<i64> {
        self.entries.iter().map(|e| e.period).collect()
    }

    pub fn filter(&self, filter: PeriodFilter) -> impl Iterator<Item = &MinePlanEntry> + '_ {
        self.entries
            .iter()
            .filter(move |e| filter.accepts(e.period))
    }
}

fn integral(value: f64, column: &str, row: usize) -> Result<i64> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > MAX_GRID_INDEX as f64 {
        return Err(UplError::invalid_input(format!(
            "mine plan row {}: {} must be an integer, got {}",
            row, column, value
        )));
    }
    Ok(value as i64)
}
