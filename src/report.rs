//! Serializable results handed to the rendering layer.
//!
//! Numbers are rounded here and only here.

use serde::{Deserialize, Serialize};

use crate::analytics::{
    grade_histograms, tonnage_grade_curve, CurvePoint, ExtractionOutcome, GradeHistograms,
    Histogram,
};
use crate::block::BlockIndex;
use crate::block_model::BlockModel;
use crate::config::AppConfig;
use crate::error::Result;
use crate::mine_plan::PeriodFilter;
use crate::optimizer::UplOutcome;
use crate::valuation::PricingConfig;

pub const DEFAULT_PRECISION: u32 = 3;

pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round() / scale;
    //avoid reporting -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitStatus {
    Profitable,
    NoProfitableBlocks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitReport {
    pub status: PitStatus,
    pub value: f64,
    pub max_flow: f64,
    pub tonnage: f64,
    pub blocks: Vec<BlockIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Extracted,
    PeriodNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub status: ExtractionStatus,
    pub period: i64,
    pub cumulative: bool,
    pub tonnage: f64,
    pub plan_rows: usize,
    pub matched_blocks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub model: String,
    pub pricing: PricingConfig,
    pub block_count: usize,
    pub deposit_value: f64,
    pub pit: PitReport,
    pub tonnage_grade_curve: Vec<CurvePoint>,
    pub histograms: GradeHistograms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionReport>,
}

impl PitReport {
    pub fn new(outcome: &UplOutcome, precision: u32) -> Self {
        match outcome {
            UplOutcome::Pit(pit) => Self {
                status: PitStatus::Profitable,
                value: round_to(pit.total_value, precision),
                max_flow: round_to(pit.max_flow, precision),
                tonnage: round_to(pit.total_tonnage, precision),
                blocks: pit.blocks.clone(),
            },
            UplOutcome::NoProfitableBlocks { max_flow, .. } => Self {
                status: PitStatus::NoProfitableBlocks,
                value: 0.0,
                max_flow: round_to(*max_flow, precision),
                tonnage: 0.0,
                blocks: Vec::new(),
            },
        }
    }
}

impl ExtractionReport {
    pub fn new(outcome: &ExtractionOutcome, precision: u32) -> Self {
        let (status, filter, plan_rows, matched_blocks) = match outcome {
            ExtractionOutcome::Extracted {
                filter,
                plan_rows,
                matched_blocks,
                ..
            } => (ExtractionStatus::Extracted, *filter, *plan_rows, *matched_blocks),
            ExtractionOutcome::PeriodNotFound { filter } => {
                (ExtractionStatus::PeriodNotFound, *filter, 0, 0)
            }
        };
        Self {
            status,
            period: filter.period(),
            cumulative: matches!(filter, PeriodFilter::UpTo(_)),
            tonnage: round_to(outcome.tonnage(), precision),
            plan_rows,
            matched_blocks,
        }
    }
}

fn round_histogram(histogram: Histogram, precision: u32) -> Histogram {
    Histogram {
        edges: histogram
            .edges
            .into_iter()
            .map(|e| round_to(e, precision))
            .collect(),
        counts: histogram.counts,
    }
}

impl ScenarioReport {
    /// Assemble the report; curve and histograms cover the whole model.
    pub fn build(
        model: &BlockModel,
        outcome: &UplOutcome,
        extraction: Option<&ExtractionOutcome>,
        config: &AppConfig,
    ) -> Result<Self> {
        let precision = config.report.precision;

        let tonnage_grade_curve = tonnage_grade_curve(model.iter(), config.analytics.curve_step)?
            .points
            .into_iter()
            .map(|p| CurvePoint {
                cutoff: round_to(p.cutoff, precision),
                tonnage: round_to(p.tonnage, precision),
                average_grade: round_to(p.average_grade, precision),
            })
            .collect();

        let histograms = grade_histograms(model.iter(), config.analytics.histogram_bins)?;

        Ok(Self {
            model: model.name.clone(),
            pricing: *model.pricing(),
            block_count: model.len(),
            deposit_value: round_to(model.total_value(), precision),
            pit: PitReport::new(outcome, precision),
            tonnage_grade_curve,
            histograms: GradeHistograms {
                grade1: round_histogram(histograms.grade1, precision),
                grade2: round_histogram(histograms.grade2, precision),
            },
            extraction: extraction.map(|e| ExtractionReport::new(e, precision)),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_model::parse_block_records;
    use crate::optimizer::Optimizer;

    #[test]
    fn rounding_is_fixed_precision() {
        assert_eq!(round_to(169_925.123_456, 3), 169_925.123);
        assert_eq!(round_to(0.000_4, 3), 0.0);
        assert_eq!(round_to(-0.000_4, 3), 0.0);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn report_rounds_at_the_boundary() {
        let records = parse_block_records("0,0,0,3,0.1,0\n0,0,1,7,0,0.01\n".as_bytes()).unwrap();
        let model = BlockModel::from_records("demo", &records, &PricingConfig::default()).unwrap();
        let outcome = Optimizer::default().optimize(&model).unwrap();
        let report = ScenarioReport::build(&model, &outcome, None, &AppConfig::default()).unwrap();

        assert_eq!(report.pit.status, PitStatus::Profitable);
        assert_eq!(report.pit.value, round_to(outcome.total_value(), 3));
        assert_eq!(report.block_count, 2);
        for point in &report.tonnage_grade_curve {
            assert_eq!(point.average_grade, round_to(point.average_grade, 3));
        }

        let json = report.to_json().unwrap();
        assert!(json.contains("\"status\": \"profitable\""));
        assert!(!json.contains("extraction"));
    }

    #[test]
    fn extraction_report_keeps_signal() {
        let outcome = ExtractionOutcome::PeriodNotFound {
            filter: PeriodFilter::At(3),
        };
        let report = ExtractionReport::new(&outcome, 3);
        assert_eq!(report.status, ExtractionStatus::PeriodNotFound);
        assert_eq!(report.tonnage, 0.0);
        assert_eq!(report.period, 3);
        assert!(!report.cumulative);
    }
}
