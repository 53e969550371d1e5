// Integration tests for bagscan
use approx::assert_abs_diff_eq;
use bagscan::{
    Bag, BagDistance, CachedDistance, ClusterLabel, DistanceCache, DistanceValue, Error, Index,
    IndexConfig, Metric, MetricConfig, MetricKind, PointMetric, RangeBoundary,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn line_index(boundary: RangeBoundary) -> Index<Metric> {
    let bags = [0.0, 1.0, 2.0, 3.0, 10.0]
        .iter()
        .enumerate()
        .map(|(i, &x)| Bag::single(i as u64, vec![x]).unwrap());
    let config = IndexConfig {
        boundary,
        num_threads: None,
    };
    Index::build_with(bags, CachedDistance::new(Metric::from_name("point", PointMetric::Euclidean).unwrap()), config)
        .unwrap()
}

fn random_bags(seed: u64, count: usize, dim: usize) -> Vec<Bag> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let center = if i % 2 == 0 { 0.0 } else { 3.0 };
            let n = rng.random_range(1..5);
            let instances = (0..n)
                .map(|_| (0..dim).map(|_| center + rng.random_range(-1.0..1.0)).collect())
                .collect();
            Bag::new(format!("bag-{:02}", i), instances).unwrap()
        })
        .collect()
}

struct CountingMetric {
    calls: AtomicUsize,
}

impl BagDistance for CountingMetric {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn compute(&self, a: &Bag, b: &Bag) -> bagscan::Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((a.instances()[0][0] - b.instances()[0][0]).abs())
    }
}

#[test]
fn test_core_distance_on_a_line() {
    let index = line_index(RangeBoundary::Inclusive);
    let query = index.get("0").unwrap().bag().clone();

    let result = index.core_distance(3, 5.0, &query).unwrap();
    assert_eq!(result.epsilon_neighborhood.len(), 4);
    assert_eq!(result.neighbors.len(), 3);
    assert_eq!(result.core_distance, DistanceValue::Value(2.0));

    let keys: Vec<&str> = result
        .neighbors
        .iter()
        .map(|n| index.point(n.index).key())
        .collect();
    assert_eq!(keys, vec!["0", "1", "2"]);
}

#[test]
fn test_core_distance_undefined_when_neighborhood_too_small() {
    let index = line_index(RangeBoundary::Inclusive);
    let query = index.get("4").unwrap().bag().clone();

    // only the point itself lies within 5 of position 10
    let result = index.core_distance(2, 5.0, &query).unwrap();
    assert_eq!(result.epsilon_neighborhood.len(), 1);
    assert_eq!(result.core_distance, DistanceValue::Undefined);
    assert!(!result.core_distance.is_defined());
}

#[test]
fn test_range_boundaries() {
    let inclusive = line_index(RangeBoundary::Inclusive);
    let exclusive = line_index(RangeBoundary::Exclusive);
    let query = Bag::single("q", vec![0.0]).unwrap();

    assert_eq!(inclusive.epsilon_range_query(2.0, &query).unwrap().len(), 3);
    assert_eq!(exclusive.epsilon_range_query(2.0, &query).unwrap().len(), 2);

    // the radius test on d_k follows the same boundary
    assert_eq!(
        inclusive.core_distance(3, 2.0, &query).unwrap().core_distance,
        DistanceValue::Value(2.0)
    );
    assert_eq!(
        exclusive.core_distance(3, 2.0, &query).unwrap().core_distance,
        DistanceValue::Undefined
    );
}

#[test]
fn test_knn_is_bounded_and_ascending() {
    let index = line_index(RangeBoundary::Inclusive);
    let query = Bag::single("q", vec![2.4]).unwrap();

    let knn = index.k_nearest_neighbor_query(3, 100.0, &query).unwrap();
    let distances: Vec<f64> = knn.neighbors.iter().map(|n| n.distance).collect();
    assert_eq!(knn.neighbors.len(), 3);
    assert_eq!(knn.epsilon_neighborhood.len(), 5);
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert_abs_diff_eq!(distances[0], 0.4, epsilon = 1e-12);

    let all = index.k_nearest_neighbor_query(50, 1.0, &query).unwrap();
    assert_eq!(all.neighbors.len(), 5);
    assert_eq!(all.epsilon_neighborhood.len(), 2);
}

#[test]
fn test_parallel_matches_sequential_under_emd() {
    let bags = random_bags(42, 16, 2);
    let config = IndexConfig {
        boundary: RangeBoundary::Inclusive,
        num_threads: Some(4),
    };
    let index = Index::build_with(bags, CachedDistance::new(Metric::default()), config).unwrap();

    for key in ["bag-00", "bag-03", "bag-10"] {
        let query = index.get(key).unwrap().bag().clone();
        for epsilon in [0.5, 1.5, 4.0] {
            let seq = index.epsilon_range_query(epsilon, &query).unwrap();
            let par = index.par_epsilon_range_query(epsilon, &query).unwrap();
            let seq_set: HashSet<usize> = seq.iter().map(|n| n.index).collect();
            let par_set: HashSet<usize> = par.iter().map(|n| n.index).collect();
            assert_eq!(seq_set, par_set, "query {} at epsilon {}", key, epsilon);
            assert!(seq_set.contains(&index.position(key).unwrap()));
        }
    }
}

#[test]
fn test_each_pair_computed_once() {
    let bags: Vec<Bag> = (0..6u64).map(|i| Bag::single(i, vec![i as f64]).unwrap()).collect();
    let metric = Arc::new(CountingMetric {
        calls: AtomicUsize::new(0),
    });
    let index = Index::build(bags, metric.clone()).unwrap();
    let query = Bag::single("q", vec![2.5]).unwrap();

    index.epsilon_range_query(1.0, &query).unwrap();
    index.par_epsilon_range_query(1.0, &query).unwrap();
    index.core_distance(2, 1.0, &query).unwrap();
    assert_eq!(metric.calls.load(Ordering::SeqCst), 6);

    assert_eq!(index.warm_cache().unwrap(), 15);
    assert_eq!(metric.calls.load(Ordering::SeqCst), 6 + 15);
    index.warm_cache().unwrap();
    assert_eq!(metric.calls.load(Ordering::SeqCst), 6 + 15);

    let stats = index.distance().cache_stats();
    assert_eq!(stats.misses, 21);
    assert_eq!(stats.entries, 21);
}

#[test]
fn test_shared_cache_across_indexes() {
    let cache = Arc::new(DistanceCache::new());
    let bags = random_bags(5, 6, 3);

    let first = Index::build_with(
        bags.clone(),
        CachedDistance::with_cache(Metric::default(), cache.clone()),
        IndexConfig::default(),
    )
    .unwrap();
    first.warm_cache().unwrap();
    let misses = cache.stats().misses;

    let second = Index::build_with(
        bags,
        CachedDistance::with_cache(Metric::default(), cache.clone()),
        IndexConfig::default(),
    )
    .unwrap();
    let d1 = first.distance_between("bag-01", "bag-04").unwrap();
    let d2 = second.distance_between("bag-04", "bag-01").unwrap();
    assert_eq!(d1, d2);
    assert_eq!(cache.stats().misses, misses);
}

#[test]
fn test_dimension_mismatch_for_every_metric() {
    let bags = random_bags(9, 4, 2);
    let query = Bag::new("q", vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]]).unwrap();

    for kind in [MetricKind::Point, MetricKind::EarthMovers, MetricKind::Mahalanobis] {
        let metric = Metric::from_config(&MetricConfig {
            kind,
            point: PointMetric::Euclidean,
        });
        let index = Index::build(bags.clone(), metric).unwrap();

        assert!(matches!(
            index.epsilon_range_query(1.0, &query),
            Err(Error::DimensionMismatch { expected: 3, actual: 2 })
        ));
        match index.par_epsilon_range_query(1.0, &query) {
            Err(Error::WorkerTaskFailure { source, .. }) => {
                assert!(matches!(*source, Error::DimensionMismatch { .. }))
            }
            other => panic!("{:?}: expected worker failure, got {:?}", kind, other),
        }
        assert_eq!(index.distance().cache_stats().entries, 0);
    }
}

#[test]
fn test_bags_and_config_from_json() {
    let json = r#"[
        {"id": 1, "label": "pos", "instances": [[0.0, 0.0], [0.0, 1.0]]},
        {"id": "two", "instances": [[0.5, 0.5]]},
        {"id": 3, "instances": [[8.0, 8.0], [9.0, 9.0]]}
    ]"#;
    let bags: Vec<Bag> = serde_json::from_str(json).unwrap();
    assert_eq!(bags[0].label(), Some("pos"));

    let config = IndexConfig::from_json(r#"{"boundary": "exclusive", "num_threads": 2}"#).unwrap();
    let metric_config: MetricConfig = serde_json::from_str(r#"{"kind": "point", "point": "manhattan"}"#).unwrap();
    let index = Index::build_with(
        bags,
        CachedDistance::new(Metric::from_config(&metric_config)),
        config,
    )
    .unwrap();

    assert_eq!(index.keys().collect::<Vec<_>>(), vec!["1", "3", "two"]);
    // centroids (0, 0.5) and (0.5, 0.5) are 0.5 apart under Manhattan
    assert_abs_diff_eq!(index.distance_between("1", "two").unwrap(), 0.5);

    assert!(IndexConfig::from_json(r#"{"num_threads": 0}"#).is_err());
    assert!(serde_json::from_str::<Vec<Bag>>(r#"[{"id": 1, "instances": []}]"#).is_err());
}

#[test]
fn test_assignment_round() {
    let mut index = line_index(RangeBoundary::Inclusive);
    for key in ["0", "1", "2", "3", "4"] {
        index.update_core_distance(key, 2, 1.5).unwrap();
    }
    assert_eq!(index.get("0").unwrap().core_distance, DistanceValue::Value(1.0));
    assert_eq!(index.get("4").unwrap().core_distance, DistanceValue::Undefined);

    let summary = index
        .evaluate_assignment([
            ("0", ClusterLabel::Cluster(0)),
            ("1", ClusterLabel::Cluster(0)),
            ("2", ClusterLabel::Cluster(0)),
            ("4", ClusterLabel::Noise),
        ])
        .unwrap();
    assert_eq!(summary.noise, 1);
    assert_eq!(summary.unclassified, 1);
    let cluster = &summary.clusters[&0];
    assert_eq!(cluster.size, 3);
    // pairs (0,1), (0,2), (1,2)
    assert_abs_diff_eq!(cluster.mean_intra_distance, 4.0 / 3.0, epsilon = 1e-12);
    assert_eq!(index.get("3").unwrap().cluster_label.as_i32().unwrap(), ClusterLabel::UNCLASSIFIED);

    index.reset_bookkeeping();
    assert!(index.points().all(|p| p.cluster_label == ClusterLabel::Unclassified));
    assert!(index.points().all(|p| !p.core_distance.is_defined()));
}

#[test]
fn test_duplicate_bag_ids_rejected() {
    let bags = vec![
        Bag::single("a", vec![0.0]).unwrap(),
        Bag::single("a", vec![1.0]).unwrap(),
    ];
    assert!(matches!(Index::build(bags, Metric::default()), Err(Error::DuplicateKey(k)) if k == "a"));
}
