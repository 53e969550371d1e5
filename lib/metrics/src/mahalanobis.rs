//! Squared Mahalanobis distance between bag centroids under the pooled
//! (0.5 / 0.5) covariance of the two bags.

use bagscan_core::{Bag, BagDistance, Result};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Residual `|C · C⁻¹ - I|` above which an LU inverse is treated as singular
const INVERSE_TOLERANCE: f64 = 1e-8;
/// Singular values below this (relative to the largest) are dropped by the pseudo-inverse
const PSEUDO_INVERSE_RCOND: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Default)]
pub struct MahalanobisDistance;

impl MahalanobisDistance {
    pub fn new() -> Self {
        Self
    }
}

/// Mean vector and population covariance (divided by n) of a bag's instances
fn moments(bag: &Bag) -> (DVector<f64>, DMatrix<f64>) {
    let dim = bag.dim();
    let mean = DVector::from_vec(bag.mean());
    let mut covariance = DMatrix::<f64>::zeros(dim, dim);
    for instance in bag.instances() {
        let centered = DVector::from_column_slice(instance) - &mean;
        covariance += &centered * centered.transpose();
    }
    covariance /= bag.len() as f64;
    (mean, covariance)
}

/// Inverse of a covariance matrix, falling back to the SVD pseudo-inverse
/// when it is singular or too ill-conditioned for LU.
fn invert_covariance(covariance: &DMatrix<f64>) -> DMatrix<f64> {
    let dim = covariance.nrows();
    if let Some(inverse) = covariance.clone().try_inverse() {
        let residual = (covariance * &inverse - DMatrix::<f64>::identity(dim, dim)).amax();
        if residual.is_finite() && residual < INVERSE_TOLERANCE {
            return inverse;
        }
    }

    debug!(dim, "pooled covariance is singular, using pseudo-inverse");
    let svd = covariance.clone().svd(true, true);
    let largest = svd.singular_values.max();
    let eps = (largest * PSEUDO_INVERSE_RCOND).max(f64::MIN_POSITIVE);
    match svd.pseudo_inverse(eps) {
        Ok(pinv) => pinv,
        // only reachable with a negative eps
        Err(_) => DMatrix::zeros(dim, dim),
    }
}

impl BagDistance for MahalanobisDistance {
    fn name(&self) -> &'static str {
        "mahalanobis"
    }

    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
        a.check_dim(b)?;
        let (mean_a, cov_a) = moments(a);
        let (mean_b, cov_b) = moments(b);

        let pooled = cov_a * 0.5 + cov_b * 0.5;
        let inverse = invert_covariance(&pooled);
        let diff = mean_a - mean_b;
        Ok(diff.dot(&(&inverse * &diff)).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bagscan_core::Error;

    fn cross(id: &str, cx: f64, cy: f64) -> Bag {
        Bag::new(
            id,
            vec![
                vec![cx + 1.0, cy],
                vec![cx - 1.0, cy],
                vec![cx, cy + 1.0],
                vec![cx, cy - 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_moments() {
        let (mean, cov) = moments(&cross("a", 2.0, 3.0));
        assert_abs_diff_eq!(mean[0], 2.0);
        assert_abs_diff_eq!(mean[1], 3.0);
        assert_abs_diff_eq!(cov[(0, 0)], 0.5);
        assert_abs_diff_eq!(cov[(1, 1)], 0.5);
        assert_abs_diff_eq!(cov[(0, 1)], 0.0);
    }

    #[test]
    fn test_regular_covariance() {
        // pooled covariance diag(0.5, 0.5), inverse diag(2, 2), mean shift (2, 0)
        let a = cross("a", 0.0, 0.0);
        let b = cross("b", 2.0, 0.0);
        let d = MahalanobisDistance.compute(&a, &b).unwrap();
        assert_abs_diff_eq!(d, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(MahalanobisDistance.compute(&b, &a).unwrap(), d, epsilon = 1e-12);
    }

    #[test]
    fn test_self_distance() {
        let a = cross("a", 5.0, -1.0);
        assert_abs_diff_eq!(MahalanobisDistance.compute(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_singular_covariance_uses_pseudo_inverse() {
        // both bags vary only along x: pooled covariance diag(1, 0)
        let a = Bag::new("a", vec![vec![0.0, 0.0], vec![2.0, 0.0]]).unwrap();
        let b = Bag::new("b", vec![vec![1.0, 1.0], vec![3.0, 1.0]]).unwrap();
        let d = MahalanobisDistance.compute(&a, &b).unwrap();
        assert_abs_diff_eq!(d, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_instance_bags() {
        // zero covariance: the pseudo-inverse is zero, so every distance collapses to 0
        let a = Bag::single("a", vec![0.0, 0.0]).unwrap();
        let b = Bag::single("b", vec![3.0, 4.0]).unwrap();
        assert_abs_diff_eq!(MahalanobisDistance.compute(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = Bag::single("a", vec![0.0, 0.0]).unwrap();
        let b = Bag::single("b", vec![0.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            MahalanobisDistance.compute(&a, &b),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
