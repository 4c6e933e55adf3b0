use serde::{Deserialize, Serialize};

use crate::error::{Result, UplError};

pub const DEFAULT_METAL_PRICE: f64 = 1_000_000.0;
pub const DEFAULT_METAL_RECOVERY: f64 = 0.85;
pub const DEFAULT_MINING_COST: f64 = 2.5;
pub const DEFAULT_PROCESSING_COST: f64 = 5.0;

/// Economic parameters used to value every block.
///
/// Defaults: metal price 1 000 000 per unit of metal, 85 % recovery,
/// mining cost 2.5 and processing cost 5.0 per tonne.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub metal_price: f64,
    pub metal_recovery: f64,
    pub mining_cost: f64,
    pub processing_cost: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            metal_price: DEFAULT_METAL_PRICE,
            metal_recovery: DEFAULT_METAL_RECOVERY,
            mining_cost: DEFAULT_MINING_COST,
            processing_cost: DEFAULT_PROCESSING_COST,
        }
    }
}

impl PricingConfig {
    pub fn new(
        metal_price: f64,
        metal_recovery: f64,
        mining_cost: f64,
        processing_cost: f64,
    ) -> Result<Self> {
        let pricing = Self {
            metal_price,
            metal_recovery,
            mining_cost,
            processing_cost,
        };
        pricing.validate()?;
        Ok(pricing)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("metal_price", self.metal_price),
            ("metal_recovery", self.metal_recovery),
            ("mining_cost", self.mining_cost),
            ("processing_cost", self.processing_cost),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(UplError::invalid_input(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.metal_recovery > 1.0 {
            return Err(UplError::invalid_input(format!(
                "metal_recovery must lie in [0, 1], got {}",
                self.metal_recovery
            )));
        }
        Ok(())
    }
}

/// Where a block goes once it is inside the pit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Process,
    Waste,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockValuation {
    pub value_if_processed: f64,
    pub value_if_mined_only: f64,
    pub destination: Destination,
}

impl BlockValuation {
    pub fn value(&self) -> f64 {
        match self.destination {
            Destination::Process => self.value_if_processed,
            Destination::Waste => self.value_if_mined_only,
        }
    }
}

/// Value a block given its grade and tonnage.
///
/// The block is processed when that beats sending it to the dump; ties go to waste.
pub fn value_block(grade: f64, tonnage: f64, pricing: &PricingConfig) -> Result<BlockValuation> {
    if !(tonnage > 0.0) || !tonnage.is_finite() {
        return Err(UplError::invalid_input(format!(
            "tonnage must be positive to value a block, got {}",
            tonnage
        )));
    }
    if !grade.is_finite() {
        return Err(UplError::invalid_input(format!("grade must be finite, got {}", grade)));
    }

    let value_if_processed = grade * pricing.metal_price * pricing.metal_recovery
        - (pricing.mining_cost + pricing.processing_cost) * tonnage;
    let value_if_mined_only = -pricing.mining_cost * tonnage;

    let destination = if value_if_processed > value_if_mined_only {
        Destination::Process
    } else {
        Destination::Waste
    };

    Ok(BlockValuation {
        value_if_processed,
        value_if_mined_only,
        destination,
    })
}

/// Net value of a block, `max(processed, mined only)`.
pub fn block_value(grade: f64, tonnage: f64, pricing: &PricingConfig) -> Result<f64> {
    value_block(grade, tonnage, pricing).map(|v| v.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_block_is_processed() {
        let pricing = PricingConfig::default();
        let valuation = value_block(0.2, 10.0, &pricing).unwrap();
        assert_eq!(valuation.destination, Destination::Process);
        assert!((valuation.value() - 169_925.0).abs() < 1e-6);
    }

    #[test]
    fn barren_block_is_waste() {
        let pricing = PricingConfig::default();
        let value = block_value(0.0, 10.0, &pricing).unwrap();
        assert_eq!(value, -25.0);
    }

    #[test]
    fn value_is_max_of_both_candidates() {
        let pricing = PricingConfig::new(5_000.0, 0.9, 3.0, 4.0).unwrap();
        for (grade, tonnage) in [(0.0, 1.0), (0.001, 100.0), (0.05, 12.0), (1.0, 0.5)] {
            let v = value_block(grade, tonnage, &pricing).unwrap();
            assert_eq!(v.value(), v.value_if_processed.max(v.value_if_mined_only));
        }
    }

    #[test]
    fn mined_only_dominates_for_tiny_tonnage() {
        // fixed grade, tonnage shrinking toward zero
        let pricing = PricingConfig::new(0.0, 0.85, 2.5, 5.0).unwrap();
        for tonnage in [1.0, 1e-3, 1e-9] {
            let v = value_block(0.3, tonnage, &pricing).unwrap();
            assert_eq!(v.destination, Destination::Waste);
            assert_eq!(v.value(), -2.5 * tonnage);
        }
    }

    #[test]
    fn zero_tonnage_is_rejected() {
        let err = block_value(0.1, 0.0, &PricingConfig::default()).unwrap_err();
        assert!(matches!(err, UplError::InvalidInput(_)));
        assert!(block_value(0.1, -4.0, &PricingConfig::default()).is_err());
    }

    #[test]
    fn pricing_validation() {
        assert!(PricingConfig::new(1.0, 1.2, 0.0, 0.0).is_err());
        assert!(PricingConfig::new(-1.0, 0.5, 0.0, 0.0).is_err());
        assert!(PricingConfig::new(1.0, 0.5, f64::NAN, 0.0).is_err());
        assert!(PricingConfig::new(0.0, 0.0, 0.0, 0.0).is_ok());
    }
}
