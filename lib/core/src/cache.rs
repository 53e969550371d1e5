//! Memoized bag-to-bag distances.

use ahash::{AHashMap, RandomState};
use parking_lot::RwLock;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::BagId;

const SHARDS: usize = 16;

/// Unordered pair of bag identities under one metric: `{a, b}` and `{b, a}`
/// map to the same key, while distinct metric fingerprints never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    metric: Arc<str>,
    low: BagId,
    high: BagId,
}

impl PairKey {
    pub fn new(metric: &Arc<str>, a: &BagId, b: &BagId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            metric: metric.clone(),
            low: low.clone(),
            high: high.clone(),
        }
    }
}

/// Hit/miss counters of a [`DistanceCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Thread-safe distance memo, sharded so unrelated pairs do not contend on one lock.
///
/// Entries are keyed by metric fingerprint as well as the bag pair, so one
/// cache can back several metrics. The first value stored for a pair wins; later inserts for the same pair
/// leave the published entry untouched.
pub struct DistanceCache {
    shards: Vec<RwLock<AHashMap<PairKey, f64>>>,
    hasher: RandomState,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| RwLock::new(AHashMap::new())).collect(),
            hasher: RandomState::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &PairKey) -> &RwLock<AHashMap<PairKey, f64>> {
        let idx = BuildHasher::hash_one(&self.hasher, key) as usize % SHARDS;
        &self.shards[idx]
    }

    pub fn get(&self, metric: &Arc<str>, a: &BagId, b: &BagId) -> Option<f64> {
        let key = PairKey::new(metric, a, b);
        self.shard(&key).read().get(&key).copied()
    }

    /// Store a distance, returning the value now published for the pair
    pub fn insert(&self, metric: &Arc<str>, a: &BagId, b: &BagId, distance: f64) -> f64 {
        let key = PairKey::new(metric, a, b);
        *self.shard(&key).write().entry(key).or_insert(distance)
    }

    /// Look the pair up, computing and storing it on a miss.
    ///
    /// `compute` runs outside any lock. Two threads missing on the same pair
    /// may both compute; only the first result is kept and both return it.
    pub fn get_or_try_insert_with<E>(
        &self,
        metric: &Arc<str>,
        a: &BagId,
        b: &BagId,
        compute: impl FnOnce() -> Result<f64, E>,
    ) -> Result<f64, E> {
        let key = PairKey::new(metric, a, b);
        let shard = self.shard(&key);

        if let Some(d) = shard.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*d);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let distance = compute()?;
        Ok(*shard.write().entry(key).or_insert(distance))
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.write().clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DistanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceCache").field("stats", &self.stats()).finish()
    }
}
