use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::block::BlockInterface;
use crate::error::{Result, UplError};

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Equal width bins; `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeHistograms {
    pub grade1: Histogram,
    pub grade2: Histogram,
}

/// Bucket `values` over `[min, max]`, last bin closed on the right.
///
/// A single distinct value spans `[v - 0.5, v + 0.5]`; no values span `[0, 1]`.
pub fn histogram<I>(values: I, bins: usize) -> Result<Histogram>
where
    I: IntoIterator<Item = f64>,
{
    if bins == 0 {
        return Err(UplError::invalid_input("histogram needs at least one bin"));
    }
    let values = values.into_iter().collect::<Vec<_>>();
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(UplError::invalid_input(format!(
            "cannot bucket non-finite value {}",
            bad
        )));
    }

    let (low, high) = match values.iter().map(|v| OrderedFloat(*v)).minmax() {
        MinMaxResult::NoElements => (0.0, 1.0),
        MinMaxResult::OneElement(v) => (v.0 - 0.5, v.0 + 0.5),
        MinMaxResult::MinMax(lo, hi) if lo == hi => (lo.0 - 0.5, hi.0 + 0.5),
        MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
    };

    let width = (high - low) / bins as f64;
    let mut edges = (0..bins).map(|i| low + i as f64 * width).collect::<Vec<_>>();
    edges.push(high);

    let mut counts = vec![0; bins];
    for v in values {
        let bin = (((v - low) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram { edges, counts })
}

pub fn grade_histograms<B, I>(blocks: I, bins: usize) -> Result<GradeHistograms>
where
    B: BlockInterface,
    I: IntoIterator<Item = B>,
{
    let (grade1, grade2): (Vec<f64>, Vec<f64>) = blocks
        .into_iter()
        .map(|b| (b.grade1(), b.grade2()))
        .unzip();

    Ok(GradeHistograms {
        grade1: histogram(grade1, bins)?,
        grade2: histogram(grade2, bins)?,
    })
}
