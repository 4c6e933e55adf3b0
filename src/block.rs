use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UplError};
use crate::valuation::{value_block, Destination, PricingConfig};

/// Largest grid index magnitude accepted on load, so stepping to a neighbour
/// or flipping the depth sign cannot overflow.
pub const MAX_GRID_INDEX: i64 = i64::MAX / 2;

/// Integer grid position of a block. `z` is elevation: it grows upward.
#[derive(
    Debug, PartialEq, Copy, Clone, Hash, Eq, Default, Serialize, Deserialize, PartialOrd, Ord,
)]
pub struct BlockIndex {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockIndex {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// `true` when every axis is within [`MAX_GRID_INDEX`].
    pub fn is_in_grid(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|v| v.unsigned_abs() <= MAX_GRID_INDEX as u64)
    }

    /// Position as written in depth-down input files.
    pub fn from_depth(x: i64, y: i64, depth: i64) -> Self {
        Self { x, y, z: -depth }
    }

    pub fn depth(&self) -> i64 {
        -self.z
    }

    pub fn above(&self) -> Self {
        Self {
            z: self.z + 1,
            ..*self
        }
    }

    pub fn below(&self) -> Self {
        Self {
            z: self.z - 1,
            ..*self
        }
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Categorical rock label assigned by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RockType(pub String);

impl RockType {
    pub fn new(name: impl Into<String>) -> Self {
        RockType(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything the analytics can sweep over.
pub trait BlockInterface {
    //position in the grid
    fn index(&self) -> BlockIndex;

    fn tonnage(&self) -> f64;
    fn metal1(&self) -> f64;
    fn metal2(&self) -> f64;

    fn grade1(&self) -> f64 {
        self.metal1() / self.tonnage()
    }

    fn grade2(&self) -> f64 {
        self.metal2() / self.tonnage()
    }
}

/// One row of a block file, before valuation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub ind: BlockIndex,
    pub tonnage: f64,
    pub metal1: f64,
    pub metal2: f64,
}

impl BlockRecord {
    pub fn new(ind: BlockIndex, tonnage: f64, metal1: f64, metal2: f64) -> Self {
        Self {
            ind,
            tonnage,
            metal1,
            metal2,
        }
    }
}

impl BlockInterface for BlockRecord {
    fn index(&self) -> BlockIndex {
        self.ind
    }

    fn tonnage(&self) -> f64 {
        self.tonnage
    }

    fn metal1(&self) -> f64 {
        self.metal1
    }

    fn metal2(&self) -> f64 {
        self.metal2
    }
}

/// A valued block of the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub ind: BlockIndex,
    pub tonnage: f64,
    pub metal1: f64,
    pub metal2: f64,
    pub grade1: f64,
    pub grade2: f64,
    pub economic_value: f64,
    pub destination: Destination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rock_type: Option<RockType>,
}

impl Block {
    /// Value a raw record. Fails when the tonnage cannot carry a grade.
    pub fn from_record(record: &BlockRecord, pricing: &PricingConfig) -> Result<Self> {
        if !record.ind.is_in_grid() {
            return Err(UplError::invalid_input(format!(
                "block {} lies outside the grid bound {}",
                record.ind, MAX_GRID_INDEX
            )));
        }
        if !(record.tonnage > 0.0) || !record.tonnage.is_finite() {
            return Err(UplError::invalid_input(format!(
                "block {} has non-positive tonnage {}",
                record.ind, record.tonnage
            )));
        }
        for (name, value) in [("metal1", record.metal1), ("metal2", record.metal2)] {
            if !value.is_finite() || value < 0.0 {
                return Err(UplError::invalid_input(format!(
                    "block {} has invalid {} content {}",
                    record.ind, name, value
                )));
            }
        }

        let grade1 = record.grade1();
        let grade2 = record.grade2();
        let valuation = value_block(grade1, record.tonnage, pricing)?;

        Ok(Self {
            ind: record.ind,
            tonnage: record.tonnage,
            metal1: record.metal1,
            metal2: record.metal2,
            grade1,
            grade2,
            economic_value: valuation.value(),
            destination: valuation.destination,
            rock_type: None,
        })
    }

    pub fn record(&self) -> BlockRecord {
        BlockRecord::new(self.ind, self.tonnage, self.metal1, self.metal2)
    }

    pub fn is_profitable(&self) -> bool {
        self.economic_value > 0.0
    }
}

impl BlockInterface for Block {
    fn index(&self) -> BlockIndex {
        self.ind
    }

    fn tonnage(&self) -> f64 {
        self.tonnage
    }

    fn metal1(&self) -> f64 {
        self.metal1
    }

    fn metal2(&self) -> f64 {
        self.metal2
    }

    fn grade1(&self) -> f64 {
        self.grade1
    }

    fn grade2(&self) -> f64 {
        self.grade2
    }
}

impl<T: BlockInterface> BlockInterface for &T {
    fn index(&self) -> BlockIndex {
        (*self).index()
    }

    fn tonnage(&self) -> f64 {
        (*self).tonnage()
    }

    fn metal1(&self) -> f64 {
        (*self).metal1()
    }

    fn metal2(&self) -> f64 {
        (*self).metal2()
    }

    fn grade1(&self) -> f64 {
        (*self).grade1()
    }

    fn grade2(&self) -> f64 {
        (*self).grade2()
    }
}
