use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::block::{Block, BlockIndex, BlockRecord, MAX_GRID_INDEX};
use crate::error::{Result, UplError};
use crate::rock_type::RockTypeClassifier;
use crate::valuation::PricingConfig;

/// Sparse block model stored as an arena sorted by coordinate.
///
/// Only populated coordinates exist. Blocks are addressed by slot (their
/// position in the arena) or by [`BlockIndex`] through the lookup table.
#[derive(Clone, Debug)]
pub struct BlockModel {
    pub name: String,
    blocks: Vec<Block>,
    lookup: HashMap<BlockIndex, usize>,
    pricing: PricingConfig,
}

impl BlockModel {
    /// Value every record and build the arena.
    ///
    /// Duplicate coordinates and non-positive tonnage fail the whole build.
    pub fn from_records(
        name: impl Into<String>,
        records: &[BlockRecord],
        pricing: &PricingConfig,
    ) -> Result<Self> {
        pricing.validate()?;

        let mut blocks = records
            .iter()
            .map(|record| Block::from_record(record, pricing))
            .collect::<Result<Vec<_>>>()?;
        blocks.sort_by_key(|block| block.ind);

        let mut lookup = HashMap::with_capacity(blocks.len());
        for (slot, block) in blocks.iter().enumerate() {
            if lookup.insert(block.ind, slot).is_some() {
                return Err(UplError::invalid_input(format!(
                    "duplicate block at {}",
                    block.ind
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            blocks,
            lookup,
            pricing: *pricing,
        })
    }

    /// Read a header-less block file and value it.
    pub fn load(path: impl AsRef<Path>, pricing: &PricingConfig) -> Result<Self> {
        let path = path.as_ref();
        let records = read_block_file(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let model = Self::from_records(name, &records, pricing)?;
        info!(
            model = %model.name,
            blocks = model.len(),
            total_value = model.total_value(),
            "loaded block model"
        );
        Ok(model)
    }

    /// Rebuild the model under new pricing. Rock types are carried over.
    pub fn revalue(&self, pricing: &PricingConfig) -> Result<Self> {
        let records = self.blocks.iter().map(Block::record).collect::<Vec<_>>();
        let mut model = Self::from_records(self.name.clone(), &records, pricing)?;
        for (block, old) in model.blocks.iter_mut().zip(self.blocks.iter()) {
            block.rock_type = old.rock_type.clone();
        }
        Ok(model)
    }

    /// Label every block with the first matching rule.
    pub fn with_rock_types(mut self, classifier: &RockTypeClassifier) -> Self {
        for block in self.blocks.iter_mut() {
            block.rock_type = Some(classifier.classify(&block.ind).clone());
        }
        debug!(rules = classifier.rules().len(), "classified rock types");
        self
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn slot(&self, ind: &BlockIndex) -> Option<usize> {
        self.lookup.get(ind).copied()
    }

    pub fn get(&self, ind: &BlockIndex) -> Option<&Block> {
        self.slot(ind).map(|slot| &self.blocks[slot])
    }

    pub fn block_at(&self, slot: usize) -> &Block {
        &self.blocks[slot]
    }

    pub fn contains(&self, ind: &BlockIndex) -> bool {
        self.lookup.contains_key(ind)
    }

    /// Sum of every block value, mined or not.
    pub fn total_value(&self) -> f64 {
        self.blocks.iter().map(|b| b.economic_value).sum()
    }

    pub fn total_tonnage(&self) -> f64 {
        self.blocks.iter().map(|b| b.tonnage).sum()
    }

    /// Highest elevation present, i.e. the shallowest bench.
    pub fn surface_elevation(&self) -> Option<i64> {
        self.blocks.iter().map(|b| b.ind.z).max()
    }

}

/// Parse a header-less `X,Y,Z,Tonnage,Metal1,Metal2` file. `Z` is depth and is negated.
pub fn read_block_file(path: impl AsRef<Path>) -> Result<Vec<BlockRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        UplError::invalid_input(format!(
            "failed to open block file '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse_block_records(file)
}

pub fn parse_block_records<R: Read>(reader: R) -> Result<Vec<BlockRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_idx + 1;

        if record.len() == 1 && record.get(0).map_or(true, str::is_empty) {
            continue;
        }
        if record.len() != 6 {
            return Err(UplError::invalid_input(format!(
                "row {}: expected 6 columns (X,Y,Z,Tonnage,Metal1,Metal2), found {}",
                row,
                record.len()
            )));
        }

        let x = parse_coord(&record, 0, "X", row)?;
        let y = parse_coord(&record, 1, "Y", row)?;
        let depth = parse_coord(&record, 2, "Z", row)?;
        let tonnage = parse_number(&record, 3, "Tonnage", row)?;
        let metal1 = parse_number(&record, 4, "Metal1", row)?;
        let metal2 = parse_number(&record, 5, "Metal2", row)?;

        if !(tonnage > 0.0) {
            return Err(UplError::invalid_input(format!(
                "row {}: tonnage must be positive, got {}",
                row, tonnage
            )));
        }

        records.push(BlockRecord::new(
            BlockIndex::from_depth(x, y, depth),
            tonnage,
            metal1,
            metal2,
        ));
    }

    Ok(records)
}

pub(crate) fn parse_number(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    row: usize,
) -> Result<f64> {
    let raw = record.get(index).unwrap_or("");
    let value = raw.parse::<f64>().map_err(|_| {
        UplError::invalid_input(format!(
            "row {}: column {} is not numeric: '{}'",
            row, column, raw
        ))
    })?;
    if !value.is_finite() {
        return Err(UplError::invalid_input(format!(
            "row {}: column {} is not finite: '{}'",
            row, column, raw
        )));
    }
    Ok(value)
}

/// Grid coordinates may be written as `6` or `6.0`, never `6.5`.
pub(crate) fn parse_coord(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    row: usize,
) -> Result<i64> {
    let raw = record.get(index).unwrap_or("");
    let out_of_grid = || {
        UplError::invalid_input(format!(
            "row {}: column {} is not an integral grid index: '{}'",
            row, column, raw
        ))
    };
    if let Ok(value) = raw.parse::<i64>() {
        if value.unsigned_abs() > MAX_GRID_INDEX as u64 {
            return Err(out_of_grid());
        }
        return Ok(value);
    }
    let value = parse_number(record, index, column, row)?;
    if value.fract() != 0.0 || value.abs() > MAX_GRID_INDEX as f64 {
        return Err(out_of_grid());
    }
    Ok(value as i64)
}
