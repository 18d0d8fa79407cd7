// crates/drape-core/src/catalog.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DrapeError;

/// Product category. Each category has its own embedding space conventions,
/// variant prompts, and variance mask.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Clothing worn by a model.
    #[default]
    Apparel,
    /// Glasses and frames.
    Eyewear,
}

impl Category {
    /// Every known category, in the order mask discovery processes them.
    pub const ALL: [Category; 2] = [Category::Eyewear, Category::Apparel];

    /// Lowercase tag used in file names and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Apparel => "apparel",
            Category::Eyewear => "eyewear",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apparel" => Ok(Category::Apparel),
            "eyewear" => Ok(Category::Eyewear),
            other => Err(DrapeError::InvalidParameter(format!(
                "unknown category '{}' (expected apparel|eyewear)",
                other
            ))),
        }
    }
}

/// Opaque reference to an image: a path relative to the data directory, an
/// absolute path, or a remote URL returned by a hosted model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference points at a remote resource rather than a file.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://") || self.0.starts_with("data:")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Stable unique identifier (also the key into the embedding table).
    pub id: String,
    /// Category tag.
    pub category: Category,
    /// Hidden from the public catalog listing but still eligible for scoring.
    #[serde(default)]
    pub recommendation_only: bool,
    /// Image reference. Not interpreted by ranking.
    pub image_path: String,
}

impl Product {
    pub fn image(&self) -> ImageRef {
        ImageRef::new(self.image_path.clone())
    }
}

/// Optional per-product attributes used when choosing a base image for
/// mask discovery.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductMetadata {
    /// Category override, if the metadata source records one.
    #[serde(default)]
    pub category: Option<Category>,
    /// Apparel presentation style (e.g., "model", "flatlay").
    #[serde(default)]
    pub presentation: Option<String>,
    /// Eyewear kind (e.g., "eyeglasses", "sunglasses").
    #[serde(default, rename = "eyewearType")]
    pub eyewear_type: Option<String>,
}

/// Product id -> metadata.
pub type MetadataMap = HashMap<String, ProductMetadata>;

/// A product with its similarity score against the current preference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: Product,
    /// Cosine similarity in [-1, 1]; 0 when there is no signal.
    pub score: f64,
}

impl ScoredProduct {
    pub fn new(product: Product, score: f64) -> Self {
        Self { product, score }
    }

    pub fn id(&self) -> &str {
        &self.product.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Apparel".parse::<Category>().unwrap(), Category::Apparel);
        assert_eq!(" eyewear ".parse::<Category>().unwrap(), Category::Eyewear);
        assert!("shoes".parse::<Category>().is_err());
    }

    #[test]
    fn product_defaults_recommendation_only_to_false() {
        let yaml = "id: a1\ncategory: apparel\nimage_path: public/a1.jpg\n";
        let product: Product = serde_yaml::from_str(yaml).unwrap();
        assert!(!product.recommendation_only);
        assert_eq!(product.category, Category::Apparel);
    }

    #[test]
    fn scored_product_flattens_fields() {
        let scored = ScoredProduct::new(
            Product {
                id: "e1".to_string(),
                category: Category::Eyewear,
                recommendation_only: true,
                image_path: "img/e1.jpg".to_string(),
            },
            0.5,
        );
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["id"], "e1");
        assert_eq!(json["category"], "eyewear");
        assert_eq!(json["score"], 0.5);
    }

    #[test]
    fn metadata_reads_eyewear_type_key() {
        let yaml = "eyewearType: eyeglasses\n";
        let meta: ProductMetadata = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.eyewear_type.as_deref(), Some("eyeglasses"));
        assert!(meta.presentation.is_none());
    }

    #[test]
    fn image_ref_detects_remote() {
        assert!(ImageRef::new("https://cdn/x.jpg").is_remote());
        assert!(!ImageRef::new("public/x.jpg").is_remote());
    }
}
