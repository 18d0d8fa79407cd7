// crates/drape-core/src/mask.rs
//
// Variance mask artifact and discovery run manifest.
//
// A variance mask records, for one category, which embedding dimensions moved
// the most when a single base image was re-rendered with controlled
// category-specific edits. Field names follow the JSON layout of the
// `masks/{category}_mask.json` artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::error::DrapeError;

/// Parameters a mask was built with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaskParams {
    /// Number of variants requested.
    pub variants: usize,
    /// Fraction of dimensions marked high-variance, in (0, 1].
    pub percentile: f64,
    /// Weight assigned to high-variance dimensions.
    pub high_weight: f64,
    /// Weight assigned to every other dimension.
    pub low_weight: f64,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            variants: 8,
            percentile: 0.2,
            high_weight: 1.0,
            low_weight: 0.1,
        }
    }
}

/// One audited dimension: its index and raw variance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DimensionVariance {
    #[serde(rename = "i")]
    pub index: usize,
    pub variance: f64,
}

/// A variant that could not be generated or embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantFailure {
    /// Variant position within the run.
    pub index: usize,
    /// Prompt the variant was generated from.
    pub prompt: String,
    /// Which step failed: "generate" or "embed".
    pub stage: String,
    /// Error description.
    pub error: String,
}

/// The persisted per-category mask.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VarianceMask {
    pub category: Category,
    /// Product whose image the variants were generated from.
    pub base_product_id: String,
    pub run_id: String,
    /// Experiment directory relative to the data root.
    #[serde(default)]
    pub experiment_dir: Option<String>,
    pub params: MaskParams,
    /// Prompts of the variants that contributed a vector.
    #[serde(default)]
    pub prompts: Vec<String>,
    /// Image references of the variants that contributed a vector.
    #[serde(default)]
    pub variant_images: Vec<String>,
    /// Full per-dimension variance profile.
    #[serde(default)]
    pub variance: Vec<f64>,
    /// Number of dimensions that received the high weight.
    pub top_k: usize,
    /// Up to 50 highest-variance dimensions, descending.
    pub top_dims: Vec<DimensionVariance>,
    /// One weight per embedding dimension.
    pub weights: Vec<f64>,
    #[serde(default)]
    pub failures: Vec<VariantFailure>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl VarianceMask {
    /// Embedding dimensionality this mask applies to.
    pub fn dimensions(&self) -> usize {
        self.weights.len()
    }

    /// Check that the mask fits vectors of the given length.
    pub fn ensure_dimensions(&self, expected: usize) -> Result<(), DrapeError> {
        if self.weights.len() != expected {
            return Err(DrapeError::DimensionMismatch {
                index: 0,
                expected,
                found: self.weights.len(),
            });
        }
        Ok(())
    }
}

/// Record of a discovery run, written next to the run's artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub category: Category,
    pub run_id: String,
    pub base_product_id: String,
    pub base_image_path: String,
    pub experiment_dir: String,
    pub variants: usize,
    pub prompts: Vec<String>,
    pub variant_image_paths: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub mask_path: Option<String>,
    #[serde(default)]
    pub failed_variants: usize,
}
