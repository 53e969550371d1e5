use bagscan_core::{Bag, BagDistance, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::{EarthMoversDistance, MahalanobisDistance, PointDistance, PointMetric};

/// The known bag metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Point,
    #[default]
    EarthMovers,
    Mahalanobis,
}

impl FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "point" | "centroid" => Ok(MetricKind::Point),
            "emd" | "earth_movers" | "earth-movers" => Ok(MetricKind::EarthMovers),
            "mahalanobis" => Ok(MetricKind::Mahalanobis),
            other => Err(Error::InvalidConfig(format!("unknown metric: {}", other))),
        }
    }
}

/// Metric selection, deserializable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub kind: MetricKind,
    /// Ground distance between instances (unused by Mahalanobis)
    pub point: PointMetric,
}

/// Closed set of bag metrics, dispatched statically
#[derive(Debug, Clone)]
pub enum Metric {
    Point(PointDistance),
    EarthMovers(EarthMoversDistance),
    Mahalanobis(MahalanobisDistance),
}

impl Metric {
    pub fn from_config(config: &MetricConfig) -> Self {
        match config.kind {
            MetricKind::Point => Metric::Point(PointDistance::new(config.point)),
            MetricKind::EarthMovers => Metric::EarthMovers(EarthMoversDistance::new(config.point)),
            MetricKind::Mahalanobis => Metric::Mahalanobis(MahalanobisDistance::new()),
        }
    }

    /// Look a metric up by name (`point`, `emd`, `mahalanobis`, ...)
    pub fn from_name(name: &str, point: PointMetric) -> Result<Self> {
        let kind = name.parse()?;
        Ok(Self::from_config(&MetricConfig { kind, point }))
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Point(_) => MetricKind::Point,
            Metric::EarthMovers(_) => MetricKind::EarthMovers,
            Metric::Mahalanobis(_) => MetricKind::Mahalanobis,
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::from_config(&MetricConfig::default())
    }
}

impl BagDistance for Metric {
    fn name(&self) -> &'static str {
        match self {
            Metric::Point(m) => m.name(),
            Metric::EarthMovers(m) => m.name(),
            Metric::Mahalanobis(m) => m.name(),
        }
    }

    fn fingerprint(&self) -> String {
        match self {
            Metric::Point(m) => m.fingerprint(),
            Metric::EarthMovers(m) => m.fingerprint(),
            Metric::Mahalanobis(m) => m.fingerprint(),
        }
    }

    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
        match self {
            Metric::Point(m) => m.compute(a, b),
            Metric::EarthMovers(m) => m.compute(a, b),
            Metric::Mahalanobis(m) => m.compute(a, b),
        }
    }
}
