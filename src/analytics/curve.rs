use std::cmp::Reverse;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::block::BlockInterface;
use crate::error::{Result, UplError};

pub const DEFAULT_CURVE_STEP: f64 = 0.01;

const MAX_CUTOFFS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub cutoff: f64,
    pub tonnage: f64,
    pub average_grade: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TonnageGradeCurve {
    pub points: Vec<CurvePoint>,
}

impl TonnageGradeCurve {
    pub fn cutoffs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cutoff).collect()
    }

    pub fn tonnages(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.tonnage).collect()
    }

    pub fn average_grades(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.average_grade).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Cumulative tonnage and mean grade above each cutoff `k * step`, `k = 0..`,
/// up to the richest block.
///
/// Blocks are sorted once by descending grade and swept from the highest
/// cutoff down, so the cost is `O(n log n + cutoffs)`.
pub fn tonnage_grade_curve<B, I>(blocks: I, step: f64) -> Result<TonnageGradeCurve>
where
    B: BlockInterface,
    I: IntoIterator<Item = B>,
{
    if !step.is_finite() || step <= 0.0 {
        return Err(UplError::invalid_input(format!(
            "curve step must be positive, got {}",
            step
        )));
    }

    let sorted = blocks
        .into_iter()
        .map(|b| (b.grade1(), b.tonnage(), b.metal1()))
        .sorted_by_key(|(grade, _, _)| Reverse(OrderedFloat(*grade)))
        .collect::<Vec<_>>();

    let max_grade = match sorted.first() {
        Some((grade, _, _)) => *grade,
        None => return Ok(TonnageGradeCurve::default()),
    };

    let count = (max_grade / step).floor() as usize + 1;
    if count > MAX_CUTOFFS {
        return Err(UplError::invalid_input(format!(
            "curve step {} yields more than {} cutoffs",
            step, MAX_CUTOFFS
        )));
    }
    let cutoffs = (0..count)
        .map(|k| k as f64 * step)
        .filter(|c| *c <= max_grade)
        .collect::<Vec<_>>();

    let mut points = Vec::with_capacity(cutoffs.len());
    let mut next = 0;
    let mut tonnage = 0.0;
    let mut metal = 0.0;
    for &cutoff in cutoffs.iter().rev() {
        while next < sorted.len() && sorted[next].0 >= cutoff {
            tonnage += sorted[next].1;
            metal += sorted[next].2;
            next += 1;
        }
        let average_grade = if tonnage > 0.0 { metal / tonnage } else { 0.0 };
        points.push(CurvePoint {
            cutoff,
            tonnage,
            average_grade,
        });
    }
    points.reverse();

    Ok(TonnageGradeCurve { points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockIndex, BlockRecord};

    fn record(tonnage: f64, metal: f64) -> BlockRecord {
        BlockRecord::new(BlockIndex::default(), tonnage, metal, 0.0)
    }

    #[test]
    fn sweeps_cutoffs_up_to_max_grade() {
        let blocks = vec![record(10.0, 0.5), record(20.0, 0.4), record(5.0, 0.0)];
        // grades 0.05, 0.02, 0.0
        let curve = tonnage_grade_curve(&blocks, 0.01).unwrap();
        assert_eq!(curve.points.len(), 6);
        assert_eq!(curve.points[0].tonnage, 35.0);
        assert!((curve.points[0].average_grade - 0.9 / 35.0).abs() < 1e-12);
        assert_eq!(curve.points[1].tonnage, 30.0);
        assert_eq!(curve.points[5].tonnage, 10.0);
        assert!((curve.points[5].average_grade - 0.05).abs() < 1e-12);
    }

    #[test]
    fn tonnage_never_increases() {
        let blocks: Vec<_> = (1..60)
            .map(|i| record(1.0 + (i % 7) as f64, ((i * 37) % 23) as f64 * 0.05))
            .collect();
        let curve = tonnage_grade_curve(&blocks, 0.005).unwrap();
        for pair in curve.points.windows(2) {
            assert!(pair[1].tonnage <= pair[0].tonnage);
            assert!(pair[1].cutoff > pair[0].cutoff);
        }
    }

    #[test]
    fn barren_model_has_single_point() {
        let blocks = vec![record(4.0, 0.0), record(6.0, 0.0)];
        let curve = tonnage_grade_curve(&blocks, 0.01).unwrap();
        assert_eq!(curve.points.len(), 1);
        assert_eq!(curve.points[0].tonnage, 10.0);
        assert_eq!(curve.points[0].average_grade, 0.0);
    }

    #[test]
    fn empty_input_gives_empty_curve() {
        let blocks: Vec<BlockRecord> = Vec::new();
        assert!(tonnage_grade_curve(&blocks, 0.01).unwrap().is_empty());
    }

    #[test]
    fn bad_step_is_rejected() {
        let blocks = vec![record(1.0, 0.1)];
        assert!(tonnage_grade_curve(&blocks, 0.0).is_err());
        assert!(tonnage_grade_curve(&blocks, f64::NAN).is_err());
        assert!(tonnage_grade_curve(&blocks, 1e-12).is_err());
    }
}
