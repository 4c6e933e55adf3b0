//! Reporting computations over block collections: the tonnage-grade curve,
//! grade histograms, sections and plan extraction accounting.

mod curve;
mod extraction;
mod histogram;
mod section;

pub use curve::{tonnage_grade_curve, CurvePoint, TonnageGradeCurve, DEFAULT_CURVE_STEP};
pub use extraction::{extracted_tonnage, mined_through, remaining_blocks, ExtractionOutcome};
pub use histogram::{
    grade_histograms, histogram, GradeHistograms, Histogram, DEFAULT_HISTOGRAM_BINS,
};
pub use section::{section, SectionAxis, SectionPoint};
