//! Linear-scan query engines.
//!
//! The reference implementation of every query: walk the whole
//! relation, compute true distances, keep what qualifies. The
//! index-accelerated variants must return exactly these results.

use std::sync::Arc;

use galena::cancel::CancellationToken;
use galena::distance::{DistanceFunction, DistanceQuery, DistanceResultPair};
use galena::errors::GalenaError;
use galena::id::ObjectId;
use galena::relation::Relation;

use crate::errors::SpatialResult;
use crate::query::priority::KnnCollector;
use crate::query::rknn::{check_cancel, classify_reverse_neighbors, kth_distance_table};
use crate::query::{validate_k, validate_query_dims, validate_radius, KnnCapable, RangeCapable, RknnCapable};

/// Scan-based query engine over a relation and a distance function.
#[derive(Clone)]
pub struct LinearScan {
    dq: DistanceQuery,
}

impl LinearScan {
    pub fn new(relation: Arc<dyn Relation>, function: Arc<dyn DistanceFunction>) -> Self {
        LinearScan {
            dq: DistanceQuery::new(relation, function),
        }
    }

    pub fn from_distance_query(dq: DistanceQuery) -> Self {
        LinearScan { dq }
    }

    fn relation(&self) -> &dyn Relation {
        self.dq.relation().as_ref()
    }
}

impl RangeCapable for LinearScan {
    fn range_query(&self, query: &[f64], radius: f64) -> SpatialResult<Vec<DistanceResultPair>> {
        validate_radius(radius)?;
        validate_query_dims(self.relation(), query)?;

        let mut result = Vec::new();
        for id in self.relation().ids() {
            let d = self.dq.distance_to(query, id)?.to_f64();
            if d <= radius {
                result.push(DistanceResultPair::new(d, id));
            }
        }
        result.sort_unstable();
        Ok(result)
    }
}

impl KnnCapable for LinearScan {
    fn knn_query(&self, query: &[f64], k: usize) -> SpatialResult<Vec<DistanceResultPair>> {
        validate_k(k)?;
        validate_query_dims(self.relation(), query)?;

        let mut collector = KnnCollector::new(k);
        for id in self.relation().ids() {
            let d = self.dq.distance_to(query, id)?.to_f64();
            collector.offer(DistanceResultPair::new(d, id));
        }
        Ok(collector.into_sorted_vec())
    }

    fn bulk_knn_query(
        &self,
        queries: &[ObjectId],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> SpatialResult<Vec<Vec<DistanceResultPair>>> {
        validate_k(k)?;
        let mut result = Vec::with_capacity(queries.len());
        for &qid in queries {
            check_cancel(cancel)?;
            let coords = self
                .relation()
                .get(qid)
                .ok_or(GalenaError::NotFound(qid))?
                .to_vec();
            result.push(self.knn_query(&coords, k)?);
        }
        Ok(result)
    }
}

impl RknnCapable for LinearScan {
    fn rknn_query(&self, query: &[f64], k: usize) -> SpatialResult<Vec<DistanceResultPair>> {
        validate_k(k)?;
        validate_query_dims(self.relation(), query)?;

        let table = kth_distance_table(self.relation(), k, None, |coords| {
            self.knn_query(coords, k)
        })?;
        classify_reverse_neighbors(&table, self.relation(), query, |a, b| {
            Ok(self.dq.function().distance(a, b)?.to_f64())
        })
    }

    fn bulk_rknn_query(
        &self,
        queries: &[ObjectId],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> SpatialResult<Vec<Vec<DistanceResultPair>>> {
        validate_k(k)?;

        // one table build answers the whole batch
        let table = kth_distance_table(self.relation(), k, cancel, |coords| {
            self.knn_query(coords, k)
        })?;

        let mut result = Vec::with_capacity(queries.len());
        for &qid in queries {
            check_cancel(cancel)?;
            let coords = self
                .relation()
                .get(qid)
                .ok_or(GalenaError::NotFound(qid))?
                .to_vec();
            result.push(classify_reverse_neighbors(
                &table,
                self.relation(),
                &coords,
                |a, b| Ok(self.dq.function().distance(a, b)?.to_f64()),
            )?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena::distance::EuclideanDistance;
    use galena::errors::GalenaError;
    use galena::relation::VectorRelation;

    fn sample_scan() -> LinearScan {
        // A(0,0), B(1,0), C(0,1), D(5,5)
        let relation = VectorRelation::from_pairs(vec![
            (ObjectId::from(1), vec![0.0, 0.0]),
            (ObjectId::from(2), vec![1.0, 0.0]),
            (ObjectId::from(3), vec![0.0, 1.0]),
            (ObjectId::from(4), vec![5.0, 5.0]),
        ])
        .unwrap();
        LinearScan::new(Arc::new(relation), Arc::new(EuclideanDistance))
    }

    #[test]
    fn test_knn_tie_resolves_by_id() {
        let scan = sample_scan();
        let result = scan.knn_query(&[0.0, 0.0], 2).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], DistanceResultPair::new(0.0, ObjectId::from(1)));
        // B and C are both at distance 1.0; B wins by id
        assert_eq!(result[1], DistanceResultPair::new(1.0, ObjectId::from(2)));
    }

    #[test]
    fn test_knn_with_small_relation_returns_all() {
        let scan = sample_scan();
        let result = scan.knn_query(&[0.0, 0.0], 10).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_range_is_exact() {
        let scan = sample_scan();
        let result = scan.range_query(&[0.0, 0.0], 1.0).unwrap();
        let expected = vec![
            DistanceResultPair::new(0.0, ObjectId::from(1)),
            DistanceResultPair::new(1.0, ObjectId::from(2)),
            DistanceResultPair::new(1.0, ObjectId::from(3)),
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_invalid_parameters_fail_fast() {
        let scan = sample_scan();
        assert!(matches!(
            scan.knn_query(&[0.0, 0.0], 0),
            Err(crate::errors::SpatialError::Core(GalenaError::InvalidQuery(_)))
        ));
        assert!(scan.range_query(&[0.0, 0.0], -1.0).is_err());
        assert!(matches!(
            scan.knn_query(&[0.0], 1),
            Err(crate::errors::SpatialError::Core(
                GalenaError::DimensionMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_empty_relation_yields_empty_results() {
        let scan = LinearScan::new(
            Arc::new(VectorRelation::new()),
            Arc::new(EuclideanDistance),
        );
        assert!(scan.knn_query(&[0.0, 0.0], 3).unwrap().is_empty());
        assert!(scan.range_query(&[0.0, 0.0], 1.0).unwrap().is_empty());
        assert!(scan.rknn_query(&[0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_rknn_member_appears_in_own_result() {
        let scan = sample_scan();
        // query with A's own coordinates: distance 0 is always within
        // A's neighborhood
        let result = scan.rknn_query(&[0.0, 0.0], 2).unwrap();
        assert!(result
            .iter()
            .any(|p| p.id == ObjectId::from(1) && p.distance == 0.0));
    }

    #[test]
    fn test_rknn_with_fewer_than_k_neighbors_keeps_everyone() {
        let scan = sample_scan();
        // k larger than the relation: every member's k-th distance is
        // unbounded, so every member qualifies for any query
        let result = scan.rknn_query(&[100.0, 100.0], 10).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_rknn_excludes_far_outlier_queries() {
        let scan = sample_scan();
        // D(5,5) has its 2 nearest within the cluster; a far query
        // point is nobody's near neighbor
        let result = scan.rknn_query(&[50.0, 50.0], 2).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_bulk_rknn_matches_single_queries() {
        let scan = sample_scan();
        let queries = [ObjectId::from(1), ObjectId::from(4)];
        let bulk = scan.bulk_rknn_query(&queries, 2, None).unwrap();
        assert_eq!(bulk.len(), 2);
        for (qid, batch_result) in queries.iter().zip(&bulk) {
            let coords = sample_scan()
                .relation()
                .get(*qid)
                .unwrap()
                .to_vec();
            let single = scan.rknn_query(&coords, 2).unwrap();
            assert_eq!(&single, batch_result);
        }
    }

    #[test]
    fn test_bulk_queries_cancel_all_or_nothing() {
        let scan = sample_scan();
        let token = CancellationToken::new();
        token.cancel();
        let queries = [ObjectId::from(1)];
        assert!(matches!(
            scan.bulk_rknn_query(&queries, 2, Some(&token)),
            Err(crate::errors::SpatialError::Core(GalenaError::Cancelled))
        ));
        assert!(matches!(
            scan.bulk_knn_query(&queries, 2, Some(&token)),
            Err(crate::errors::SpatialError::Core(GalenaError::Cancelled))
        ));
    }
}
