//! The bag-distance contract and its memoization layer.

use std::sync::Arc;
use crate::{Bag, CacheStats, DistanceCache, Result};

/// A bag-to-bag distance.
///
/// Implementations return a non-negative value and fail with
/// [`Error::DimensionMismatch`](crate::Error::DimensionMismatch) when the two
/// bags have different attribute counts. Symmetry is assumed, not checked.
pub trait BagDistance: Send + Sync {
    /// Short metric name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Identifies the metric together with its parameters. Metrics with equal
    /// fingerprints share cached distances, so two metrics that can disagree
    /// on a pair must return different fingerprints.
    fn fingerprint(&self) -> String {
        self.name().to_string()
    }

    /// Evaluate the distance without memoization
    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64>;
}

impl<M: BagDistance + ?Sized> BagDistance for Arc<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fingerprint(&self) -> String {
        (**self).fingerprint()
    }

    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
        (**self).compute(a, b)
    }
}

impl<M: BagDistance + ?Sized> BagDistance for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fingerprint(&self) -> String {
        (**self).fingerprint()
    }

    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
        (**self).compute(a, b)
    }
}

/// A metric wrapped with a [`DistanceCache`] keyed by the metric fingerprint
/// and the unordered pair of bag ids.
///
/// The cache is injected, so several indexes (or several metrics) can share
/// one, or each can own its own.
#[derive(Debug, Clone)]
pub struct CachedDistance<M> {
    metric: M,
    fingerprint: Arc<str>,
    cache: Arc<DistanceCache>,
}

impl<M: BagDistance> CachedDistance<M> {
    /// Wrap `metric` with a fresh, private cache
    pub fn new(metric: M) -> Self {
        Self::with_cache(metric, Arc::new(DistanceCache::new()))
    }

    pub fn with_cache(metric: M, cache: Arc<DistanceCache>) -> Self {
        let fingerprint = Arc::from(metric.fingerprint());
        Self {
            metric,
            fingerprint,
            cache,
        }
    }

    /// Memoized distance between two bags
    pub fn distance(&self, a: &Bag, b: &Bag) -> Result<f64> {
        a.check_dim(b)?;
        self.cache
            .get_or_try_insert_with(&self.fingerprint, a.id(), b.id(), || self.metric.compute(a, b))
    }

    #[inline]
    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[inline]
    pub fn cache(&self) -> &Arc<DistanceCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
