//! # bagscan Metrics
//!
//! Bag-to-bag distance metrics for the bagscan index.
//!
//! ## Metrics
//!
//! - [`EarthMoversDistance`] - Optimal transport between the bags' uniform
//!   empirical distributions, solved exactly as a linear program
//! - [`MahalanobisDistance`] - Squared Mahalanobis distance between bag
//!   centroids under the pooled covariance, with a pseudo-inverse fallback
//! - [`PointDistance`] - Ground point distance between bag centroids
//!
//! Each implements [`bagscan_core::BagDistance`]; wrap it in a
//! [`bagscan_core::CachedDistance`] (or hand it to [`bagscan_core::Index::build`])
//! to memoize pair distances. [`Metric`] is the closed enum of all three,
//! constructible by name or from a [`MetricConfig`].
//!
//! ## Example
//!
//! ```rust
//! use bagscan_core::{Bag, CachedDistance};
//! use bagscan_metrics::{Metric, PointMetric};
//!
//! let a = Bag::single("a", vec![0.0, 0.0]).unwrap();
//! let b = Bag::single("b", vec![3.0, 4.0]).unwrap();
//!
//! let emd = CachedDistance::new(Metric::from_name("emd", PointMetric::Euclidean).unwrap());
//! assert!((emd.distance(&a, &b).unwrap() - 5.0).abs() < 1e-9);
//! ```

pub mod emd;
pub mod lp;
pub mod mahalanobis;
pub mod metric;
pub mod point;

pub use emd::EarthMoversDistance;
pub use lp::{LinearProgram, LpError, Relation, Solution};
pub use mahalanobis::MahalanobisDistance;
pub use metric::{Metric, MetricConfig, MetricKind};
pub use point::{PointDistance, PointMetric};
