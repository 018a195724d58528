//! Query benchmarks: linear scan vs branch-and-bound tree search.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galena::distance::EuclideanDistance;
use galena::relation::Relation;
use galena_bench::data_gen::{generate_points, generate_relation};
use galena_spatial::{
    Insertable, KnnCapable, LinearScan, RStarTree, RStarTreeConfig, RangeCapable, RknnCapable,
};

fn build_tree(relation: Arc<galena::relation::VectorRelation>) -> RStarTree {
    let tree = RStarTree::new(relation.clone(), RStarTreeConfig::default()).unwrap();
    tree.bulk_load(&relation.ids()).unwrap();
    tree
}

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query/KNN k=10");

    for size in [1_000, 10_000].iter() {
        let relation = generate_relation(*size, 2, 3);
        let tree = build_tree(relation.clone());
        let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
        let queries = generate_points(100, 2, 4);

        group.bench_with_input(BenchmarkId::new("linear", size), &queries, |b, queries| {
            b.iter(|| {
                for (_, query) in queries {
                    black_box(scan.knn_query(query, 10).unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("rstar", size), &queries, |b, queries| {
            b.iter(|| {
                for (_, query) in queries {
                    black_box(tree.knn_query(query, 10).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query/Range r=25");

    for size in [1_000, 10_000].iter() {
        let relation = generate_relation(*size, 2, 5);
        let tree = build_tree(relation.clone());
        let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
        let queries = generate_points(100, 2, 6);

        group.bench_with_input(BenchmarkId::new("linear", size), &queries, |b, queries| {
            b.iter(|| {
                for (_, query) in queries {
                    black_box(scan.range_query(query, 25.0).unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("rstar", size), &queries, |b, queries| {
            b.iter(|| {
                for (_, query) in queries {
                    black_box(tree.range_query(query, 25.0).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_bulk_rknn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query/Bulk RKNN k=5");
    group.sample_size(10);

    let relation = generate_relation(1_000, 2, 7);
    let tree = build_tree(relation.clone());
    let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
    let queries: Vec<_> = relation.ids().into_iter().take(50).collect();

    group.bench_function("linear", |b| {
        b.iter(|| black_box(scan.bulk_rknn_query(&queries, 5, None).unwrap()));
    });
    group.bench_function("rstar", |b| {
        b.iter(|| black_box(tree.bulk_rknn_query(&queries, 5, None).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_knn, bench_range, bench_bulk_rknn);
criterion_main!(benches);
