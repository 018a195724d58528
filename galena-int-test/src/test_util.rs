//! Shared helpers for integration tests.

use std::sync::Arc;

use galena::id::ObjectId;
use galena::relation::VectorRelation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic pseudo-random points in `[0, 100)^dims`.
pub fn random_points(count: usize, dims: usize, seed: u64) -> Vec<(ObjectId, Vec<f64>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let coords = (0..dims).map(|_| rng.random_range(0.0..100.0)).collect();
            (ObjectId::from(i as u64), coords)
        })
        .collect()
}

/// Points forming a few dense clusters, to stress overflow handling.
pub fn clustered_points(
    clusters: usize,
    per_cluster: usize,
    dims: usize,
    seed: u64,
) -> Vec<(ObjectId, Vec<f64>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<Vec<f64>> = (0..clusters)
        .map(|_| (0..dims).map(|_| rng.random_range(0.0..1000.0)).collect())
        .collect();

    let mut points = Vec::with_capacity(clusters * per_cluster);
    for (c, center) in centers.iter().enumerate() {
        for i in 0..per_cluster {
            let coords = center
                .iter()
                .map(|&v| v + rng.random_range(-2.0..2.0))
                .collect();
            points.push((ObjectId::from((c * per_cluster + i) as u64), coords));
        }
    }
    points
}

pub fn build_relation(points: &[(ObjectId, Vec<f64>)]) -> Arc<VectorRelation> {
    Arc::new(
        VectorRelation::from_pairs(points.iter().cloned())
            .expect("test points share a dimensionality"),
    )
}
