//! # bagscan
//!
//! Similarity index and distance engine for density-based clustering of
//! bags: data points that are finite multisets of feature vectors.
//!
//! bagscan answers the neighborhood queries an OPTICS-style clustering driver
//! needs (epsilon range, bounded k-NN, core distance) under bag metrics such
//! as the Earth Mover's Distance, memoizing every pair distance it evaluates.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! bagscan bags.json --metric emd --epsilon 2.5 --min-points 4
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use bagscan::prelude::*;
//!
//! let bags = vec![
//!     Bag::new("a", vec![vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap(),
//!     Bag::new("b", vec![vec![0.0, 1.0], vec![1.0, 1.0]]).unwrap(),
//!     Bag::new("c", vec![vec![9.0, 9.0]]).unwrap(),
//! ];
//! let index = Index::build(bags, Metric::from_name("emd", PointMetric::Euclidean).unwrap()).unwrap();
//!
//! let query = index.get("a").unwrap().bag().clone();
//! let result = index.core_distance(2, 1.5, &query).unwrap();
//! let core = result.core_distance.value().unwrap();
//! assert!((core - 1.0).abs() < 1e-9);
//! ```
//!
//! ## Crate Structure
//!
//! - `bagscan-core` - Bags, data points, the bounded priority queue, the
//!   distance cache and the index
//! - `bagscan-metrics` - Earth Mover's, Mahalanobis and centroid bag metrics

// Re-export core types
pub use bagscan_core::{
    AssignmentSummary, Bag, BagDistance, BagId, BoundedPriorityQueue, CacheStats,
    CachedDistance, ClusterLabel, ClusterSummary, CoreDistanceResult, DataPoint,
    DistanceCache, DistanceValue, Error, Index, IndexConfig, KnnResult, Neighbor,
    RangeBoundary, Result,
};

// Re-export metrics
pub use bagscan_metrics::{
    EarthMoversDistance, MahalanobisDistance, Metric, MetricConfig, MetricKind,
    PointDistance, PointMetric,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Bag, BagDistance, BagId, CachedDistance, ClusterLabel, DataPoint, DistanceValue,
        Error, Index, IndexConfig, Metric, MetricConfig, Neighbor, PointMetric,
        RangeBoundary, Result,
    };
}

/// Linear programming used by the Earth Mover's Distance
pub mod lp {
    pub use bagscan_metrics::lp::{LinearProgram, LpError, Relation, Solution};
}
