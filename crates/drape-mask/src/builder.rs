// crates/drape-mask/src/builder.rs
//
// Percentile cutoff over a variance profile -> two-tier weight vector.

use drape_core::{DimensionVariance, DrapeError, MaskParams};

/// Maximum number of top dimensions recorded for auditing.
pub const TOP_DIMS_AUDIT_LIMIT: usize = 50;

/// Output of [`MaskBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaskWeights {
    /// One weight per dimension.
    pub weights: Vec<f64>,
    /// Number of dimensions given the high weight.
    pub top_k: usize,
    /// Highest-variance dimensions, descending, at most
    /// [`TOP_DIMS_AUDIT_LIMIT`].
    pub top_dims: Vec<DimensionVariance>,
}

/// Assigns `high_weight` to the top `percentile` of dimensions by variance
/// and `low_weight` to the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskBuilder {
    percentile: f64,
    high_weight: f64,
    low_weight: f64,
}

impl MaskBuilder {
    /// Validate parameters. `percentile` must lie in (0, 1] and both weights
    /// must be finite.
    pub fn new(percentile: f64, high_weight: f64, low_weight: f64) -> Result<Self, DrapeError> {
        if !(percentile > 0.0 && percentile <= 1.0) {
            return Err(DrapeError::InvalidParameter(format!(
                "percentile must be in (0, 1], got {}",
                percentile
            )));
        }
        if !high_weight.is_finite() || !low_weight.is_finite() {
            return Err(DrapeError::InvalidParameter(format!(
                "weights must be finite, got high={} low={}",
                high_weight, low_weight
            )));
        }
        Ok(Self {
            percentile,
            high_weight,
            low_weight,
        })
    }

    pub fn from_params(params: &MaskParams) -> Result<Self, DrapeError> {
        Self::new(params.percentile, params.high_weight, params.low_weight)
    }

    /// Number of dimensions selected out of `dimensions`:
    /// `max(1, ceil(dimensions * percentile))`, capped at `dimensions`.
    pub fn top_k(&self, dimensions: usize) -> usize {
        let k = (dimensions as f64 * self.percentile).ceil() as usize;
        k.max(1).min(dimensions)
    }

    pub fn build(&self, variance: &[f64]) -> Result<MaskWeights, DrapeError> {
        if variance.is_empty() {
            return Err(DrapeError::EmptyInput(
                "cannot build a mask from an empty variance vector".to_string(),
            ));
        }
        if let Some(index) = variance.iter().position(|v| !v.is_finite()) {
            return Err(DrapeError::InvalidParameter(format!(
                "variance at dimension {} is not finite ({})",
                index, variance[index]
            )));
        }

        // Descending by variance, ties by index ascending.
        let mut order: Vec<usize> = (0..variance.len()).collect();
        order.sort_by(|&a, &b| {
            variance[b].total_cmp(&variance[a]).then(a.cmp(&b))
        });

        let top_k = self.top_k(variance.len());
        let mut weights = vec![self.low_weight; variance.len()];
        for &index in &order[..top_k] {
            weights[index] = self.high_weight;
        }

        let top_dims = order[..top_k.min(TOP_DIMS_AUDIT_LIMIT)]
            .iter()
            .map(|&index| DimensionVariance {
                index,
                variance: variance[index],
            })
            .collect();

        Ok(MaskWeights {
            weights,
            top_k,
            top_dims,
        })
    }
}
