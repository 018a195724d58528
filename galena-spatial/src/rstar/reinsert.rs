//! Reinsertion candidate selection.

use std::sync::Arc;

use galena::distance::{DistanceFunction, SquaredEuclideanDistance};
use galena::errors::{GalenaError, GalenaResult};

use crate::bounding_box::BoundingBox;
use crate::config::DEFAULT_REINSERT_AMOUNT;
use crate::entry::SpatialEntry;
use crate::errors::SpatialResult;

/// Selects which entries of an overflowing node to evict for
/// reinsertion.
///
/// Returning an empty set tells the tree to split instead; a node is
/// never left over capacity.
pub trait ReinsertStrategy: Send + Sync {
    /// Indices into `entries` to evict, in reinsertion order.
    fn compute_reinserts(
        &self,
        entries: &[SpatialEntry],
        page_mbr: &BoundingBox,
    ) -> SpatialResult<Vec<usize>>;
}

/// Close reinsert: evict the fraction of entries whose centroids lie
/// farthest from the page centroid.
///
/// The metric over centroids is pluggable; squared Euclidean by
/// default. Ties are broken by original index so the selection is
/// deterministic.
pub struct CloseReinsert {
    amount: f64,
    metric: Arc<dyn DistanceFunction>,
}

impl CloseReinsert {
    /// Creates a strategy evicting `round(amount * n)` entries.
    /// `amount` must lie in the open interval (0, 0.5).
    pub fn new(amount: f64, metric: Arc<dyn DistanceFunction>) -> GalenaResult<Self> {
        if !(amount > 0.0 && amount < 0.5) {
            return Err(GalenaError::Configuration(format!(
                "reinsert amount must be in the open interval (0, 0.5), got {}",
                amount
            )));
        }
        Ok(CloseReinsert { amount, metric })
    }

    pub fn with_amount(amount: f64) -> GalenaResult<Self> {
        Self::new(amount, Arc::new(SquaredEuclideanDistance))
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl Default for CloseReinsert {
    fn default() -> Self {
        CloseReinsert {
            amount: DEFAULT_REINSERT_AMOUNT,
            metric: Arc::new(SquaredEuclideanDistance),
        }
    }
}

impl ReinsertStrategy for CloseReinsert {
    fn compute_reinserts(
        &self,
        entries: &[SpatialEntry],
        page_mbr: &BoundingBox,
    ) -> SpatialResult<Vec<usize>> {
        let count = (self.amount * entries.len() as f64).round() as usize;
        if count == 0 {
            return Ok(Vec::new());
        }

        let page_center = page_mbr.center();
        let mut scored = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let center = entry.center()?;
            let distance = self.metric.distance(&center, &page_center)?.to_f64();
            scored.push((index, distance));
        }

        // farthest first; equal distances keep original entry order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(scored.into_iter().take(count).map(|(i, _)| i).collect())
    }
}
