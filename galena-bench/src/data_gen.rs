//! Data generators for benchmarks.

use std::sync::Arc;

use galena::id::ObjectId;
use galena::relation::VectorRelation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform points in a 1000 x 1000 grid, deterministic per seed.
pub fn generate_points(count: usize, dims: usize, seed: u64) -> Vec<(ObjectId, Vec<f64>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let coords = (0..dims).map(|_| rng.gen_range(0.0..1000.0)).collect();
            (ObjectId::from(i as u64), coords)
        })
        .collect()
}

pub fn generate_relation(count: usize, dims: usize, seed: u64) -> Arc<VectorRelation> {
    let points = generate_points(count, dims, seed);
    Arc::new(VectorRelation::from_pairs(points).expect("generated points are well-formed"))
}
