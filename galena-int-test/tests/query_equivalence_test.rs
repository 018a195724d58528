//! End-to-end equivalence of the linear-scan and index-accelerated
//! query engines.
//!
//! The linear scan is the reference: for any relation and any valid
//! parameters, the tree must return exactly the same ordered results,
//! ties included.

use std::sync::Arc;

use galena::distance::EuclideanDistance;
use galena::relation::Relation;
use galena_int_test::test_util::{build_relation, clustered_points, random_points};
use galena_spatial::{
    Insertable, KnnCapable, LinearScan, RStarTree, RStarTreeConfig, RangeCapable, RknnCapable,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_knn_equivalence_on_random_data() {
    let points = random_points(300, 2, 42);
    let relation = build_relation(&points);
    let tree = RStarTree::new(
        relation.clone(),
        RStarTreeConfig::new(8, 3, 0.3).unwrap(),
    )
    .unwrap();
    for id in relation.ids() {
        tree.insert(id).unwrap();
    }
    tree.check_invariants().unwrap();

    let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
    let queries = random_points(20, 2, 43);
    for k in [1, 2, 7, 50, 300] {
        for (_, query) in &queries {
            let from_tree = tree.knn_query(query, k).unwrap();
            let from_scan = scan.knn_query(query, k).unwrap();
            assert_eq!(from_tree, from_scan, "k = {}, query = {:?}", k, query);
        }
    }
}

#[test]
fn test_range_equivalence_on_random_data() {
    let points = random_points(300, 3, 7);
    let relation = build_relation(&points);
    let tree = RStarTree::new(
        relation.clone(),
        RStarTreeConfig::new(8, 3, 0.3).unwrap(),
    )
    .unwrap();
    for id in relation.ids() {
        tree.insert(id).unwrap();
    }

    let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
    let queries = random_points(10, 3, 8);
    for radius in [0.0, 5.0, 25.0, 80.0, 500.0] {
        for (_, query) in &queries {
            let from_tree = tree.range_query(query, radius).unwrap();
            let from_scan = scan.range_query(query, radius).unwrap();
            assert_eq!(
                from_tree, from_scan,
                "radius = {}, query = {:?}",
                radius, query
            );
        }
    }
}

#[test]
fn test_equivalence_on_clustered_data() {
    // dense clusters exercise forced reinsertion and cascading splits
    let points = clustered_points(6, 40, 2, 11);
    let relation = build_relation(&points);
    let tree = RStarTree::new(
        relation.clone(),
        RStarTreeConfig::new(4, 2, 0.3).unwrap(),
    )
    .unwrap();
    for id in relation.ids() {
        tree.insert(id).unwrap();
    }
    tree.check_invariants().unwrap();
    assert!(tree.stats().reinsertions > 0, "clusters should trigger reinsertion");

    let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
    for (_, query) in clustered_points(3, 2, 2, 12) {
        let from_tree = tree.knn_query(&query, 9).unwrap();
        let from_scan = scan.knn_query(&query, 9).unwrap();
        assert_eq!(from_tree, from_scan);
    }
}

#[test]
fn test_bulk_built_tree_matches_scan() {
    let points = random_points(500, 2, 99);
    let relation = build_relation(&points);
    let tree = RStarTree::new(relation.clone(), RStarTreeConfig::default()).unwrap();
    tree.bulk_load(&relation.ids()).unwrap();
    tree.check_invariants().unwrap();

    let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
    for (_, query) in random_points(15, 2, 100) {
        assert_eq!(
            tree.knn_query(&query, 13).unwrap(),
            scan.knn_query(&query, 13).unwrap()
        );
        assert_eq!(
            tree.range_query(&query, 12.5).unwrap(),
            scan.range_query(&query, 12.5).unwrap()
        );
    }
}

#[test]
fn test_rknn_equivalence() {
    let points = random_points(120, 2, 5);
    let relation = build_relation(&points);
    let tree = RStarTree::new(
        relation.clone(),
        RStarTreeConfig::new(8, 3, 0.3).unwrap(),
    )
    .unwrap();
    for id in relation.ids() {
        tree.insert(id).unwrap();
    }

    let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
    for k in [1, 4, 10] {
        for qid in relation.ids().into_iter().step_by(17) {
            let query = relation.get(qid).unwrap().to_vec();
            assert_eq!(
                tree.rknn_query(&query, k).unwrap(),
                scan.rknn_query(&query, k).unwrap(),
                "k = {}, query id = {}",
                k,
                qid
            );
        }
    }
}
