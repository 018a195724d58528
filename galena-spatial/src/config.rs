//! Tree configuration.

use galena::errors::{GalenaError, GalenaResult};

/// Default node capacity.
pub const DEFAULT_MAX_ENTRIES: usize = 64;
/// Default minimum fill, roughly 0.4 of the capacity.
pub const DEFAULT_MIN_ENTRIES: usize = 25;
/// Default fraction of an overflowing node evicted for reinsertion.
pub const DEFAULT_REINSERT_AMOUNT: f64 = 0.3;

/// Construction-time parameters of an [`crate::rstar::RStarTree`].
///
/// Passed explicitly at construction; there is no process-wide
/// parameter registry.
#[derive(Debug, Clone)]
pub struct RStarTreeConfig {
    /// Maximum number of entries per node.
    pub max_entries: usize,
    /// Minimum number of entries per non-root node.
    pub min_entries: usize,
    /// Fraction of entries evicted on forced reinsertion, in (0, 0.5).
    pub reinsert_amount: f64,
}

impl Default for RStarTreeConfig {
    fn default() -> Self {
        RStarTreeConfig {
            max_entries: DEFAULT_MAX_ENTRIES,
            min_entries: DEFAULT_MIN_ENTRIES,
            reinsert_amount: DEFAULT_REINSERT_AMOUNT,
        }
    }
}

impl RStarTreeConfig {
    /// Creates a validated configuration.
    pub fn new(max_entries: usize, min_entries: usize, reinsert_amount: f64) -> GalenaResult<Self> {
        let config = RStarTreeConfig {
            max_entries,
            min_entries,
            reinsert_amount,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GalenaResult<()> {
        if self.max_entries < 4 {
            return Err(GalenaError::Configuration(format!(
                "max_entries must be at least 4, got {}",
                self.max_entries
            )));
        }
        if self.min_entries < 1 || self.min_entries > self.max_entries / 2 {
            return Err(GalenaError::Configuration(format!(
                "min_entries must be in [1, max_entries / 2], got {} for max_entries {}",
                self.min_entries, self.max_entries
            )));
        }
        if !(self.reinsert_amount > 0.0 && self.reinsert_amount < 0.5) {
            return Err(GalenaError::Configuration(format!(
                "reinsert_amount must be in the open interval (0, 0.5), got {}",
                self.reinsert_amount
            )));
        }
        Ok(())
    }
}
