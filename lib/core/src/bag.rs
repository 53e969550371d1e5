//! Bags: multi-instance examples made of same-dimension feature vectors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::{Error, Result};

/// Stable identity of a bag. Used as the distance-cache key, so two distinct
/// bags must never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BagId {
    Integer(u64),
    Uuid(Uuid),
    String(String),
}

impl std::fmt::Display for BagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BagId::String(s) => write!(f, "{}", s),
            BagId::Uuid(u) => write!(f, "{}", u),
            BagId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for BagId {
    fn from(s: String) -> Self {
        BagId::String(s)
    }
}

impl From<&str> for BagId {
    fn from(s: &str) -> Self {
        BagId::String(s.to_string())
    }
}

impl From<u64> for BagId {
    fn from(i: u64) -> Self {
        BagId::Integer(i)
    }
}

impl From<Uuid> for BagId {
    fn from(u: Uuid) -> Self {
        BagId::Uuid(u)
    }
}

#[derive(Deserialize)]
struct RawBag {
    id: BagId,
    #[serde(default)]
    label: Option<String>,
    instances: Vec<Vec<f64>>,
}

/// A multi-instance example: an ordered collection of feature vectors that
/// share one identity and (optionally) one class label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawBag")]
pub struct Bag {
    id: BagId,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    instances: Vec<Vec<f64>>,
    #[serde(skip)]
    dim: usize,
}

impl TryFrom<RawBag> for Bag {
    type Error = Error;

    fn try_from(raw: RawBag) -> Result<Self> {
        let bag = Bag::new(raw.id, raw.instances)?;
        Ok(match raw.label {
            Some(label) => bag.with_label(label),
            None => bag,
        })
    }
}

impl Bag {
    /// Create a bag. Every instance must have the same, non-zero attribute count.
    pub fn new(id: impl Into<BagId>, instances: Vec<Vec<f64>>) -> Result<Self> {
        let id = id.into();
        let dim = match instances.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(Error::EmptyBag(id.to_string())),
        };

        if let Some(bad) = instances.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        Ok(Self {
            id,
            label: None,
            instances,
            dim,
        })
    }

    /// Wrap a single feature vector as a one-instance bag
    pub fn single(id: impl Into<BagId>, instance: Vec<f64>) -> Result<Self> {
        Self::new(id, vec![instance])
    }

    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &BagId {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Attribute count of every instance
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of instances
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[inline]
    pub fn instances(&self) -> &[Vec<f64>] {
        &self.instances
    }

    /// Fail with `DimensionMismatch` unless `other` has the same attribute count.
    #[inline]
    pub fn check_dim(&self, other: &Bag) -> Result<()> {
        if self.dim != other.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: other.dim,
            });
        }
        Ok(())
    }

    /// Component-wise mean of the instances
    pub fn mean(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.dim];
        for instance in &self.instances {
            for (m, x) in mean.iter_mut().zip(instance) {
                *m += x;
            }
        }
        let n = self.instances.len() as f64;
        for m in &mut mean {
            *m /= n;
        }
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_creation() {
        let bag = Bag::new("b1", vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        assert_eq!(bag.dim(), 3);
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.id(), &BagId::String("b1".to_string()));
    }

    #[test]
    fn test_bag_rejects_ragged_instances() {
        let err = Bag::new(1u64, vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_bag_rejects_empty() {
        assert!(matches!(Bag::new(1u64, vec![]), Err(Error::EmptyBag(_))));
        assert!(matches!(Bag::new(1u64, vec![vec![]]), Err(Error::EmptyBag(_))));
    }

    #[test]
    fn test_mean() {
        let bag = Bag::new(7u64, vec![vec![0.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert_eq!(bag.mean(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"id": "a", "label": "pos", "instances": [[1.0, 2.0], [3.0, 4.0]]}"#;
        let bag: Bag = serde_json::from_str(json).unwrap();
        assert_eq!(bag.dim(), 2);
        assert_eq!(bag.label(), Some("pos"));

        let ragged = r#"{"id": 3, "instances": [[1.0, 2.0], [3.0]]}"#;
        assert!(serde_json::from_str::<Bag>(ragged).is_err());
    }

    #[test]
    fn test_id_variants_from_json() {
        let ids: Vec<BagId> =
            serde_json::from_str(r#"[7, "67e55044-10b1-426f-9247-bb680e5fe0c8", "bag-7"]"#).unwrap();
        assert_eq!(ids[0], BagId::Integer(7));
        assert!(matches!(ids[1], BagId::Uuid(_)));
        assert_eq!(ids[2], BagId::from("bag-7"));
        assert_eq!(ids[1].to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }
}
