//! Node splitting.

use crate::entry::SpatialEntry;
use crate::errors::{SpatialError, SpatialResult};

/// Splits an over-capacity entry list into two halves.
///
/// Entries are ordered by centroid along the axis with the widest
/// centroid spread and cut at the midpoint. With `min_entries <=
/// max_entries / 2` both halves satisfy the minimum fill.
pub(crate) fn split_entries(
    entries: Vec<SpatialEntry>,
    min_entries: usize,
) -> SpatialResult<(Vec<SpatialEntry>, Vec<SpatialEntry>)> {
    if entries.len() < 2 * min_entries {
        return Err(SpatialError::InvalidState(format!(
            "cannot split {} entries into halves of at least {}",
            entries.len(),
            min_entries
        )));
    }

    let centers: Vec<Vec<f64>> = entries
        .iter()
        .map(|e| e.center())
        .collect::<SpatialResult<_>>()?;
    let dims = centers[0].len();

    let mut split_axis = 0;
    let mut widest = f64::NEG_INFINITY;
    for d in 0..dims {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for center in &centers {
            lo = lo.min(center[d]);
            hi = hi.max(center[d]);
        }
        let spread = hi - lo;
        if spread > widest {
            widest = spread;
            split_axis = d;
        }
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        centers[a][split_axis]
            .total_cmp(&centers[b][split_axis])
            .then_with(|| entries[a].sort_key().cmp(&entries[b].sort_key()))
    });

    let mid = entries.len() / 2;
    let mut slots: Vec<Option<SpatialEntry>> = entries.into_iter().map(Some).collect();
    let mut left = Vec::with_capacity(mid);
    let mut right = Vec::with_capacity(slots.len() - mid);
    for (rank, index) in order.into_iter().enumerate() {
        let entry = slots[index].take().ok_or_else(|| {
            SpatialError::InvalidState("entry visited twice during split".into())
        })?;
        if rank < mid {
            left.push(entry);
        } else {
            right.push(entry);
        }
    }
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena::id::ObjectId;

    fn leaf(id: u64, coords: Vec<f64>) -> SpatialEntry {
        SpatialEntry::leaf(ObjectId::from(id), coords)
    }

    #[test]
    fn test_splits_along_widest_axis() {
        // spread is 10 along x, 1 along y: the cut separates x-clusters
        let entries = vec![
            leaf(1, vec![0.0, 0.0]),
            leaf(2, vec![0.5, 1.0]),
            leaf(3, vec![10.0, 0.5]),
            leaf(4, vec![9.5, 0.0]),
            leaf(5, vec![0.2, 0.2]),
        ];
        let (left, right) = split_entries(entries, 2).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 3);

        let left_ids: Vec<u64> = left.iter().map(|e| e.sort_key()).collect();
        // the two x-smallest centroids land on the left
        assert!(left_ids.contains(&1));
        assert!(left_ids.contains(&5));
    }

    #[test]
    fn test_halves_meet_minimum_fill() {
        let entries: Vec<_> = (0..9).map(|i| leaf(i, vec![i as f64])).collect();
        let (left, right) = split_entries(entries, 4).unwrap();
        assert!(left.len() >= 4);
        assert!(right.len() >= 4);
        assert_eq!(left.len() + right.len(), 9);
    }

    #[test]
    fn test_too_few_entries_is_a_defect() {
        let entries = vec![leaf(1, vec![0.0]), leaf(2, vec![1.0])];
        assert!(split_entries(entries, 2).is_err());
    }

    #[test]
    fn test_deterministic_on_ties() {
        // identical coordinates: order falls back to the entry key
        let entries: Vec<_> = (0..6).map(|i| leaf(5 - i, vec![1.0])).collect();
        let (left, _right) = split_entries(entries.clone(), 2).unwrap();
        let (left2, _right2) = split_entries(entries, 2).unwrap();
        assert_eq!(left, left2);
        let left_ids: Vec<u64> = left.iter().map(|e| e.sort_key()).collect();
        assert_eq!(left_ids, vec![0, 1, 2]);
    }
}
