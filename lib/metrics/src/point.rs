//! Distances between single feature vectors, and the centroid bag metric built on them.

use bagscan_core::{Bag, BagDistance, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ground distance between two feature vectors of equal length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointMetric {
    #[default]
    Euclidean,
    SquaredEuclidean,
    Manhattan,
    Chebyshev,
    /// `1 - cosine similarity`; a zero vector has similarity 0 to everything
    Cosine,
}

impl PointMetric {
    #[inline]
    pub fn between(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            PointMetric::Euclidean => squared_l2(a, b).sqrt(),
            PointMetric::SquaredEuclidean => squared_l2(a, b),
            PointMetric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            PointMetric::Chebyshev => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max),
            PointMetric::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }
}

impl FromStr for PointMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(PointMetric::Euclidean),
            "squared_euclidean" | "sqeuclidean" => Ok(PointMetric::SquaredEuclidean),
            "manhattan" | "l1" => Ok(PointMetric::Manhattan),
            "chebyshev" | "linf" => Ok(PointMetric::Chebyshev),
            "cosine" => Ok(PointMetric::Cosine),
            other => Err(Error::InvalidConfig(format!("unknown point metric: {}", other))),
        }
    }
}

#[inline]
fn squared_l2(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[inline]
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Baseline bag metric: the point distance between the two bags' centroids.
/// For single-instance bags this is the plain point-to-point distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointDistance {
    point: PointMetric,
}

impl PointDistance {
    pub fn new(point: PointMetric) -> Self {
        Self { point }
    }

    pub fn point_metric(&self) -> PointMetric {
        self.point
    }
}

impl BagDistance for PointDistance {
    fn name(&self) -> &'static str {
        "point"
    }

    fn fingerprint(&self) -> String {
        format!("point:{:?}", self.point)
    }

    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
        a.check_dim(b)?;
        if a.len() == 1 && b.len() == 1 {
            return Ok(self.point.between(&a.instances()[0], &b.instances()[0]));
        }
        Ok(self.point.between(&a.mean(), &b.mean()))
    }
}
