//! # bagscan Core
//!
//! Core library for density-based clustering of bags (multi-instance examples).
//!
//! This crate provides the data model and the query engine:
//!
//! - [`Bag`] - A set of same-dimension feature vectors with a stable [`BagId`]
//! - [`DataPoint`] - A bag held by an index, with cluster and density bookkeeping
//! - [`BagDistance`] / [`CachedDistance`] - Pluggable bag metric and its memoization layer
//! - [`DistanceCache`] - Sharded, thread-safe store of computed pair distances
//! - [`BoundedPriorityQueue`] - Retains the k smallest-distance items seen
//! - [`Index`] - Epsilon-range, bounded k-NN and OPTICS core-distance queries
//!
//! Concrete metrics (Earth Mover's, Mahalanobis, point) live in `bagscan-metrics`.
//!
//! ## Example
//!
//! ```rust
//! use bagscan_core::{Bag, BagDistance, DistanceValue, Index, Result};
//!
//! struct FirstAttribute;
//!
//! impl BagDistance for FirstAttribute {
//!     fn name(&self) -> &'static str {
//!         "first-attribute"
//!     }
//!
//!     fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
//!         Ok((a.instances()[0][0] - b.instances()[0][0]).abs())
//!     }
//! }
//!
//! let bags = [0.0, 1.0, 2.0, 3.0, 10.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &x)| Bag::single(i as u64, vec![x]))
//!     .collect::<Result<Vec<_>>>()
//!     .unwrap();
//! let index = Index::build(bags, FirstAttribute).unwrap();
//!
//! let query = index.get("0").unwrap().bag();
//! let result = index.core_distance(3, 5.0, query).unwrap();
//! assert_eq!(result.core_distance, DistanceValue::Value(2.0));
//! ```

pub mod bag;
pub mod cache;
pub mod distance;
pub mod error;
pub mod index;
pub mod point;
pub mod queue;

pub use bag::{Bag, BagId};
pub use cache::{CacheStats, DistanceCache, PairKey};
pub use distance::{BagDistance, CachedDistance};
pub use error::{Error, Result};
pub use index::{
    AssignmentSummary, ClusterSummary, CoreDistanceResult, Index, IndexConfig, KnnResult,
    Neighbor, RangeBoundary,
};
pub use point::{ClusterLabel, DataPoint, DistanceValue, UNDEFINED_SENTINEL};
pub use queue::BoundedPriorityQueue;
