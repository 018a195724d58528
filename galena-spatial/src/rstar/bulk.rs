//! Bulk-load partitioning.

use itertools::Itertools;

use crate::entry::SpatialEntry;
use crate::errors::SpatialResult;

/// Partitions a batch of entries into node-sized groups, bypassing
/// one-at-a-time insertion.
///
/// Every returned partition must satisfy `min_entries <= size <=
/// max_entries`, except possibly one remainder partition. The
/// partitioning must be deterministic: identical input and strategy
/// produce identical partitions.
pub trait BulkLoadStrategy: Send + Sync {
    fn partition(
        &self,
        entries: Vec<SpatialEntry>,
        min_entries: usize,
        max_entries: usize,
    ) -> SpatialResult<Vec<Vec<SpatialEntry>>>;
}

/// Sort-tile-recursive partitioning.
///
/// Entries are sorted by centroid along the first axis, sliced into
/// strips, and each strip recursively tiled along the next axis;
/// the final axis emits balanced node-sized chunks. All sorts break
/// coordinate ties by entry key, so the result depends only on the
/// input set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortTileRecursive;

impl BulkLoadStrategy for SortTileRecursive {
    fn partition(
        &self,
        entries: Vec<SpatialEntry>,
        min_entries: usize,
        max_entries: usize,
    ) -> SpatialResult<Vec<Vec<SpatialEntry>>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let dims = entries[0].dimensionality()?;
        let items: Vec<(Vec<f64>, SpatialEntry)> = entries
            .into_iter()
            .map(|e| Ok((e.center()?, e)))
            .collect::<SpatialResult<_>>()?;

        let mut partitions = Vec::new();
        tile(items, 0, dims, max_entries, &mut partitions);

        let undersized = partitions.iter().filter(|p| p.len() < min_entries).count();
        if undersized > 1 {
            log::debug!(
                "sort-tile-recursive produced {} partitions below the minimum fill of {}",
                undersized,
                min_entries
            );
        }
        Ok(partitions)
    }
}

fn tile(
    mut items: Vec<(Vec<f64>, SpatialEntry)>,
    axis: usize,
    dims: usize,
    max_entries: usize,
    out: &mut Vec<Vec<SpatialEntry>>,
) {
    let n = items.len();
    if n <= max_entries {
        out.push(items.into_iter().map(|(_, e)| e).collect_vec());
        return;
    }

    let pages = n.div_ceil(max_entries);
    items.sort_by(|a, b| {
        a.0[axis]
            .total_cmp(&b.0[axis])
            .then_with(|| a.1.sort_key().cmp(&b.1.sort_key()))
    });

    if axis + 1 >= dims {
        for chunk in chunk_balanced(items, pages) {
            out.push(chunk.into_iter().map(|(_, e)| e).collect_vec());
        }
        return;
    }

    let remaining = (dims - axis) as f64;
    let strips = (pages as f64).powf(1.0 / remaining).ceil() as usize;
    for strip in chunk_balanced(items, strips) {
        tile(strip, axis + 1, dims, max_entries, out);
    }
}

/// Splits `items` into `parts` groups whose sizes differ by at most
/// one, preserving order.
fn chunk_balanced<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    let n = items.len();
    let parts = parts.clamp(1, n.max(1));
    let base = n / parts;
    let remainder = n % parts;

    let mut chunks = Vec::with_capacity(parts);
    let mut iter = items.into_iter();
    for p in 0..parts {
        let size = base + usize::from(p < remainder);
        chunks.push(iter.by_ref().take(size).collect_vec());
    }
    chunks
}
