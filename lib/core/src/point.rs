use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use crate::{Bag, Error, Result};

/// Legacy numeric stand-in for an undefined distance (`i32::MAX` as a double).
pub const UNDEFINED_SENTINEL: f64 = 2_147_483_647.0;

/// A density distance (core or reachability) that may be undefined.
///
/// `Undefined` orders after every real value, so it always compares as the
/// worse distance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DistanceValue {
    Value(f64),
    #[default]
    Undefined,
}

impl DistanceValue {
    #[inline]
    pub fn is_defined(&self) -> bool {
        matches!(self, DistanceValue::Value(_))
    }

    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            DistanceValue::Value(v) => Some(*v),
            DistanceValue::Undefined => None,
        }
    }

    /// Numeric form for callers that still expect the sentinel encoding
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.value().unwrap_or(UNDEFINED_SENTINEL)
    }

    /// OPTICS reachability of a neighbor at `distance` from a point with this core distance:
    /// `max(core, distance)`, undefined when the core distance is.
    #[inline]
    pub fn reachability(&self, distance: f64) -> DistanceValue {
        match self {
            DistanceValue::Value(core) => DistanceValue::Value(core.max(distance)),
            DistanceValue::Undefined => DistanceValue::Undefined,
        }
    }
}

impl From<f64> for DistanceValue {
    fn from(v: f64) -> Self {
        DistanceValue::Value(v)
    }
}

impl Eq for DistanceValue {}

impl Ord for DistanceValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DistanceValue::Value(a), DistanceValue::Value(b)) => a.total_cmp(b),
            (DistanceValue::Value(_), DistanceValue::Undefined) => Ordering::Less,
            (DistanceValue::Undefined, DistanceValue::Value(_)) => Ordering::Greater,
            (DistanceValue::Undefined, DistanceValue::Undefined) => Ordering::Equal,
        }
    }
}

impl PartialOrd for DistanceValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cluster assignment of a data point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClusterLabel {
    #[default]
    Unclassified,
    Noise,
    Cluster(usize),
}

impl ClusterLabel {
    pub const UNCLASSIFIED: i32 = -1;
    pub const NOISE: i32 = -2;

    /// Integer encoding: `-1` unclassified, `-2` noise, otherwise the cluster id.
    /// Fails for cluster ids above `i32::MAX`.
    pub fn as_i32(&self) -> Result<i32> {
        match self {
            ClusterLabel::Unclassified => Ok(Self::UNCLASSIFIED),
            ClusterLabel::Noise => Ok(Self::NOISE),
            ClusterLabel::Cluster(id) => i32::try_from(*id).map_err(|_| Error::InvalidParameter {
                name: "cluster_label",
                message: format!("cluster id {} does not fit in an i32", id),
            }),
        }
    }

    pub fn from_i32(label: i32) -> Self {
        match label {
            Self::NOISE => ClusterLabel::Noise,
            l if l < 0 => ClusterLabel::Unclassified,
            l => ClusterLabel::Cluster(l as usize),
        }
    }

    #[inline]
    pub fn cluster_id(&self) -> Option<usize> {
        match self {
            ClusterLabel::Cluster(id) => Some(*id),
            _ => None,
        }
    }
}

/// A bag held by an [`Index`](crate::Index), plus the bookkeeping density
/// algorithms write while they traverse it.
#[derive(Debug, Clone)]
pub struct DataPoint {
    key: String,
    bag: Arc<Bag>,
    pub cluster_label: ClusterLabel,
    pub processed: bool,
    pub core_distance: DistanceValue,
    pub reachability_distance: DistanceValue,
}

impl DataPoint {
    #[inline]
    #[must_use]
    pub fn new(key: String, bag: Arc<Bag>) -> Self {
        Self {
            key,
            bag,
            cluster_label: ClusterLabel::Unclassified,
            processed: false,
            core_distance: DistanceValue::Undefined,
            reachability_distance: DistanceValue::Undefined,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn bag(&self) -> &Bag {
        &self.bag
    }

    #[inline]
    pub fn bag_arc(&self) -> &Arc<Bag> {
        &self.bag
    }

    /// Back to the state the point had when the index was built
    pub fn reset(&mut self) {
        self.cluster_label = ClusterLabel::Unclassified;
        self.processed = false;
        self.core_distance = DistanceValue::Undefined;
        self.reachability_distance = DistanceValue::Undefined;
    }
}
