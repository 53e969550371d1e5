use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use crate::{
    Bag, BagDistance, BoundedPriorityQueue, CachedDistance, ClusterLabel, DataPoint,
    DistanceValue, Error, Result,
};

/// Whether a candidate at exactly `epsilon` belongs to the neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBoundary {
    /// `distance <= epsilon`
    #[default]
    Inclusive,
    /// `distance < epsilon`
    Exclusive,
}

impl RangeBoundary {
    #[inline]
    pub fn admits(&self, distance: f64, epsilon: f64) -> bool {
        match self {
            RangeBoundary::Inclusive => distance <= epsilon,
            RangeBoundary::Exclusive => distance < epsilon,
        }
    }
}

/// Configuration for an index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Boundary used by range queries, the k-NN epsilon neighborhood and the
    /// core-distance radius test
    pub boundary: RangeBoundary,
    /// Worker count for parallel queries; `None` uses the global pool, sized
    /// to the available hardware parallelism
    pub num_threads: Option<usize>,
}

impl IndexConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(Error::InvalidConfig("num_threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// A point found by a query: its position in the index and its distance to the query bag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

/// Output of [`Index::k_nearest_neighbor_query`]
#[derive(Debug, Clone, Default)]
pub struct KnnResult {
    /// Up to `k` nearest points, ascending by distance, ties in index order
    pub neighbors: Vec<Neighbor>,
    /// Every point within epsilon, in index order
    pub epsilon_neighborhood: Vec<Neighbor>,
}

/// Output of [`Index::core_distance`]. The neighbor lists are returned so
/// callers can reuse them without another scan.
#[derive(Debug, Clone)]
pub struct CoreDistanceResult {
    pub neighbors: Vec<Neighbor>,
    pub epsilon_neighborhood: Vec<Neighbor>,
    pub core_distance: DistanceValue,
}

/// Per-cluster figures of an evaluated assignment
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub size: usize,
    /// Mean distance over all unordered member pairs (0 for singletons)
    pub mean_intra_distance: f64,
}

/// Result of [`Index::evaluate_assignment`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentSummary {
    pub clusters: BTreeMap<usize, ClusterSummary>,
    pub noise: usize,
    pub unclassified: usize,
}

/// An ordered collection of bags, queryable by epsilon range, bounded k-NN
/// and OPTICS core distance under a pluggable bag metric.
///
/// Points are kept in lexicographic key order; sequential queries visit them
/// in that order.
pub struct Index<M> {
    config: IndexConfig,
    points: Vec<DataPoint>,
    positions: AHashMap<String, usize>,
    distance: CachedDistance<M>,
    pool: Option<rayon::ThreadPool>,
}

impl<M: BagDistance> Index<M> {
    /// Build an index with the default configuration and a private distance cache.
    /// Each point is keyed by its bag id.
    pub fn build(bags: impl IntoIterator<Item = Bag>, metric: M) -> Result<Self> {
        Self::build_with(bags, CachedDistance::new(metric), IndexConfig::default())
    }

    pub fn build_with(
        bags: impl IntoIterator<Item = Bag>,
        distance: CachedDistance<M>,
        config: IndexConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut keyed: BTreeMap<String, Arc<Bag>> = BTreeMap::new();
        let mut dim: Option<usize> = None;
        for bag in bags {
            match dim {
                Some(expected) if expected != bag.dim() => {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: bag.dim(),
                    });
                }
                _ => dim = Some(bag.dim()),
            }
            let key = bag.id().to_string();
            if keyed.contains_key(&key) {
                return Err(Error::DuplicateKey(key));
            }
            keyed.insert(key, Arc::new(bag));
        }

        let points: Vec<DataPoint> = keyed
            .into_iter()
            .map(|(key, bag)| DataPoint::new(key, bag))
            .collect();
        let positions = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key().to_string(), i))
            .collect();

        let pool = match config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("bagscan-query-{}", i))
                    .build()
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?,
            ),
            None => None,
        };

        debug!(
            points = points.len(),
            metric = distance.metric().name(),
            boundary = ?config.boundary,
            "built index"
        );

        Ok(Self {
            config,
            points,
            positions,
            distance,
            pool,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn distance(&self) -> &CachedDistance<M> {
        &self.distance
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keys in index order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.points.iter().map(|p| p.key())
    }

    /// Points in index order
    pub fn points(&self) -> impl Iterator<Item = &DataPoint> + '_ {
        self.points.iter()
    }

    pub fn get(&self, key: &str) -> Option<&DataPoint> {
        self.positions.get(key).map(|&i| &self.points[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DataPoint> {
        self.positions.get(key).map(|&i| &mut self.points[i])
    }

    /// Position of `key` in index order
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Point at a position returned in a [`Neighbor`]. Panics when out of range.
    #[inline]
    pub fn point(&self, index: usize) -> &DataPoint {
        &self.points[index]
    }

    #[inline]
    pub fn point_mut(&mut self, index: usize) -> &mut DataPoint {
        &mut self.points[index]
    }

    fn require(&self, key: &str) -> Result<&DataPoint> {
        self.get(key)
            .ok_or_else(|| Error::PointNotFound(key.to_string()))
    }

    /// Memoized distance between two indexed points
    pub fn distance_between(&self, a: &str, b: &str) -> Result<f64> {
        let a = self.require(a)?;
        let b = self.require(b)?;
        self.distance.distance(a.bag(), b.bag())
    }

    /// Every point whose distance to `query` satisfies the configured boundary.
    /// Single-threaded, in index order.
    pub fn epsilon_range_query(&self, epsilon: f64, query: &Bag) -> Result<Vec<Neighbor>> {
        check_epsilon(epsilon)?;
        let mut found = Vec::new();
        for (index, point) in self.points.iter().enumerate() {
            let distance = self.distance.distance(query, point.bag())?;
            if self.config.boundary.admits(distance, epsilon) {
                found.push(Neighbor { index, distance });
            }
        }
        trace!(epsilon, found = found.len(), "range query");
        Ok(found)
    }

    /// Range query with distance evaluations spread over the worker pool.
    ///
    /// Returns the same set as [`epsilon_range_query`](Self::epsilon_range_query)
    /// in no guaranteed order. Any failing comparison fails the whole query with
    /// [`Error::WorkerTaskFailure`]; the call returns only after every task has finished.
    pub fn par_epsilon_range_query(&self, epsilon: f64, query: &Bag) -> Result<Vec<Neighbor>> {
        check_epsilon(epsilon)?;
        let boundary = self.config.boundary;
        let scan = || {
            self.points
                .par_iter()
                .enumerate()
                .filter_map(|(index, point)| match self.distance.distance(query, point.bag()) {
                    Ok(distance) if boundary.admits(distance, epsilon) => {
                        Some(Ok(Neighbor { index, distance }))
                    }
                    Ok(_) => None,
                    Err(source) => Some(Err(Error::WorkerTaskFailure {
                        key: point.key().to_string(),
                        source: Box::new(source),
                    })),
                })
                .collect::<Result<Vec<Neighbor>>>()
        };

        let result = match &self.pool {
            Some(pool) => pool.install(scan),
            None => scan(),
        };
        match &result {
            Ok(found) => trace!(epsilon, found = found.len(), "parallel range query"),
            Err(e) => debug!(error = %e, "parallel range query aborted"),
        }
        result
    }

    /// One pass that collects both the epsilon neighborhood and the `k`
    /// nearest points. The query bag itself is not excluded if it is indexed.
    pub fn k_nearest_neighbor_query(&self, k: usize, epsilon: f64, query: &Bag) -> Result<KnnResult> {
        check_epsilon(epsilon)?;
        let mut queue = BoundedPriorityQueue::new(k);
        let mut epsilon_neighborhood = Vec::new();

        for (index, point) in self.points.iter().enumerate() {
            let distance = self.distance.distance(query, point.bag())?;
            if self.config.boundary.admits(distance, epsilon) {
                epsilon_neighborhood.push(Neighbor { index, distance });
            }
            queue.push(distance, index);
        }

        let neighbors = queue
            .into_sorted_vec()
            .into_iter()
            .map(|(distance, index)| Neighbor { index, distance })
            .collect();

        Ok(KnnResult {
            neighbors,
            epsilon_neighborhood,
        })
    }

    /// OPTICS core distance of `query`: the distance to its `min_points`-th
    /// nearest point, provided at least `min_points` points lie within epsilon
    /// and that distance itself is within epsilon. Otherwise undefined.
    pub fn core_distance(&self, min_points: usize, epsilon: f64, query: &Bag) -> Result<CoreDistanceResult> {
        if min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 1".to_string(),
            });
        }

        let KnnResult {
            neighbors,
            epsilon_neighborhood,
        } = self.k_nearest_neighbor_query(min_points, epsilon, query)?;

        let core_distance = if epsilon_neighborhood.len() < min_points {
            DistanceValue::Undefined
        } else {
            match neighbors.get(min_points - 1) {
                Some(kth) if self.config.boundary.admits(kth.distance, epsilon) => {
                    DistanceValue::Value(kth.distance)
                }
                _ => DistanceValue::Undefined,
            }
        };

        Ok(CoreDistanceResult {
            neighbors,
            epsilon_neighborhood,
            core_distance,
        })
    }

    /// [`core_distance`](Self::core_distance) of an indexed point, stored on that point.
    pub fn update_core_distance(&mut self, key: &str, min_points: usize, epsilon: f64) -> Result<CoreDistanceResult> {
        let position = self
            .position(key)
            .ok_or_else(|| Error::PointNotFound(key.to_string()))?;
        let bag = self.points[position].bag_arc().clone();
        let result = self.core_distance(min_points, epsilon, &bag)?;
        self.points[position].core_distance = result.core_distance;
        Ok(result)
    }

    /// Return every point to its creation state (unclassified, unprocessed,
    /// undefined distances). The distance cache is kept.
    pub fn reset_bookkeeping(&mut self) {
        for point in &mut self.points {
            point.reset();
        }
    }

    /// Evaluate every unordered pair of indexed points on the worker pool so
    /// later queries hit the cache. Returns the number of pairs evaluated.
    pub fn warm_cache(&self) -> Result<usize> {
        let n = self.points.len();
        let fill = || {
            (0..n).into_par_iter().try_for_each(|i| {
                let a = &self.points[i];
                for b in &self.points[i + 1..] {
                    self.distance.distance(a.bag(), b.bag()).map_err(|source| {
                        Error::WorkerTaskFailure {
                            key: b.key().to_string(),
                            source: Box::new(source),
                        }
                    })?;
                }
                Ok::<(), Error>(())
            })
        };
        match &self.pool {
            Some(pool) => pool.install(fill)?,
            None => fill()?,
        }
        let pairs = n * n.saturating_sub(1) / 2;
        debug!(pairs, "distance cache warmed");
        Ok(pairs)
    }

    /// Apply a cluster assignment and summarize it.
    ///
    /// Listed keys receive their label, every other point becomes unclassified.
    /// Each cluster is summarized by its size and mean intra-cluster distance.
    /// Labels are written only once every distance has been evaluated; on
    /// error the points keep their previous labels.
    pub fn evaluate_assignment<K: AsRef<str>>(
        &mut self,
        assignment: impl IntoIterator<Item = (K, ClusterLabel)>,
    ) -> Result<AssignmentSummary> {
        let mut labels = vec![ClusterLabel::Unclassified; self.points.len()];
        for (key, label) in assignment {
            let key = key.as_ref();
            let position = self
                .position(key)
                .ok_or_else(|| Error::PointNotFound(key.to_string()))?;
            labels[position] = label;
        }

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut summary = AssignmentSummary::default();
        for (position, label) in labels.iter().enumerate() {
            match label {
                ClusterLabel::Cluster(id) => members.entry(*id).or_default().push(position),
                ClusterLabel::Noise => summary.noise += 1,
                ClusterLabel::Unclassified => summary.unclassified += 1,
            }
        }

        for (id, positions) in members {
            let mut total = 0.0;
            let mut pairs = 0usize;
            for (i, &a) in positions.iter().enumerate() {
                for &b in &positions[i + 1..] {
                    total += self
                        .distance
                        .distance(self.points[a].bag(), self.points[b].bag())?;
                    pairs += 1;
                }
            }
            let mean_intra_distance = if pairs == 0 { 0.0 } else { total / pairs as f64 };
            summary.clusters.insert(
                id,
                ClusterSummary {
                    size: positions.len(),
                    mean_intra_distance,
                },
            );
        }

        for (point, label) in self.points.iter_mut().zip(labels) {
            point.cluster_label = label;
        }
        Ok(summary)
    }
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    if epsilon.is_nan() || epsilon < 0.0 {
        return Err(Error::InvalidParameter {
            name: "epsilon",
            message: format!("must be a non-negative number, got {}", epsilon),
        });
    }
    Ok(())
}
