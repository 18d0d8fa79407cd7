// crates/drape-mask/src/variance.rs
//
// Per-dimension population variance over a set of equal-length vectors.

use drape_core::DrapeError;

/// Accumulates vectors and reports `max(0, mean(x^2) - mean(x)^2)` per
/// dimension. The first observed vector fixes the dimensionality.
#[derive(Debug, Clone, Default)]
pub struct VarianceEstimator {
    count: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl VarianceEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vectors observed.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Dimensionality fixed by the first vector, if any.
    pub fn dimensions(&self) -> Option<usize> {
        (self.count > 0).then_some(self.sum.len())
    }

    /// Add one vector. A vector whose length differs from the first is
    /// rejected and leaves the estimator unchanged.
    pub fn observe(&mut self, vector: &[f32]) -> Result<(), DrapeError> {
        if self.count == 0 {
            self.sum = vec![0.0; vector.len()];
            self.sum_sq = vec![0.0; vector.len()];
        } else if vector.len() != self.sum.len() {
            return Err(DrapeError::DimensionMismatch {
                index: self.count,
                expected: self.sum.len(),
                found: vector.len(),
            });
        }

        for ((s, sq), x) in self.sum.iter_mut().zip(self.sum_sq.iter_mut()).zip(vector) {
            let x = *x as f64;
            *s += x;
            *sq += x * x;
        }
        self.count += 1;
        Ok(())
    }

    /// Variance per dimension of everything observed so far.
    pub fn finish(&self) -> Result<Vec<f64>, DrapeError> {
        if self.count == 0 {
            return Err(DrapeError::EmptyInput(
                "variance needs at least one vector".to_string(),
            ));
        }

        let n = self.count as f64;
        Ok(self
            .sum
            .iter()
            .zip(&self.sum_sq)
            .map(|(s, sq)| {
                let mean = s / n;
                let variance = sq / n - mean * mean;
                // Cancellation can leave tiny negatives; NaN also maps to 0.
                variance.max(0.0)
            })
            .collect())
    }

    /// Batch form of `observe` + `finish`.
    pub fn compute<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Vec<f64>, DrapeError> {
        let mut estimator = Self::new();
        for v in vectors {
            estimator.observe(v.as_ref())?;
        }
        estimator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_variance() {
        let v = vec![0.3f32, -1.5, 7.25];
        let variance = VarianceEstimator::compute(&[v.clone(), v.clone(), v]).unwrap();
        assert_eq!(variance, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn population_variance_per_dimension() {
        let vectors = vec![vec![1.0f32, 0.0], vec![3.0, 0.0], vec![5.0, 3.0]];
        let variance = VarianceEstimator::compute(&vectors).unwrap();
        // dim 0: mean 3, mean sq 35/3 -> 8/3; dim 1: mean 1, mean sq 3 -> 2
        assert!((variance[0] - 8.0 / 3.0).abs() < 1e-9);
        assert!((variance[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn single_vector_is_zero_variance() {
        let variance = VarianceEstimator::compute(&[vec![4.0f32, -2.0]]).unwrap();
        assert_eq!(variance, vec![0.0, 0.0]);
    }

    #[test]
    fn empty_and_ragged_input_are_errors() {
        let none: Vec<Vec<f32>> = Vec::new();
        assert!(matches!(
            VarianceEstimator::compute(&none),
            Err(DrapeError::EmptyInput(_))
        ));

        let mut estimator = VarianceEstimator::new();
        estimator.observe(&[1.0, 2.0]).unwrap();
        assert!(matches!(
            estimator.observe(&[1.0]),
            Err(DrapeError::DimensionMismatch { index: 1, expected: 2, found: 1 })
        ));
        assert_eq!(estimator.count(), 1);
        assert_eq!(estimator.dimensions(), Some(2));
    }
}
