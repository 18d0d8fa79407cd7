// crates/drape-store/src/catalog.rs
//
// YAML-backed product catalog.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use drape_core::traits::CatalogSource;
use drape_core::{DrapeError, MetadataMap, Product};

use crate::layout::{read_optional, write_atomic, DataLayout};

/// Catalog stored as `products.yaml` with optional `products_metadata.yaml`.
///
/// Every call re-reads the files; there is no cache across calls.
#[derive(Debug, Clone)]
pub struct YamlCatalog {
    layout: DataLayout,
}

impl YamlCatalog {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Replace `products.yaml` with the given products.
    pub async fn save_catalog(&self, products: &[Product]) -> Result<(), DrapeError> {
        let yaml = serde_yaml::to_string(products)?;
        write_atomic(&self.layout.products_path(), yaml.as_bytes()).await
    }
}

#[async_trait]
impl CatalogSource for YamlCatalog {
    async fn load_catalog(&self) -> Result<Vec<Product>, DrapeError> {
        let path = self.layout.products_path();
        let bytes = read_optional(&path)
            .await?
            .ok_or_else(|| DrapeError::NotFound(format!("catalog file {}", path.display())))?;

        // An empty file parses as YAML null; treat it as an empty catalog.
        let products: Option<Vec<Product>> = serde_yaml::from_slice(&bytes)?;
        let products = products.unwrap_or_default();
        tracing::debug!(count = products.len(), "Loaded catalog");
        Ok(products)
    }

    async fn load_metadata(&self) -> Result<MetadataMap, DrapeError> {
        let path = self.layout.metadata_path();
        match read_optional(&path).await? {
            Some(bytes) => {
                let metadata: Option<MetadataMap> = serde_yaml::from_slice(&bytes)?;
                Ok(metadata.unwrap_or_default())
            }
            None => {
                tracing::warn!(path = %path.display(), "Product metadata not found; using empty map");
                Ok(MetadataMap::new())
            }
        }
    }
}

/// Randomly mark one third (rounded up) of the catalog as
/// `recommendation_only`, clear the flag on the rest, and return the products
/// sorted by id.
pub fn reshuffle_recommendation_only<R: Rng + ?Sized>(
    mut products: Vec<Product>,
    rng: &mut R,
) -> Vec<Product> {
    products.shuffle(rng);
    let exclusive = products.len().div_ceil(3);
    for (i, product) in products.iter_mut().enumerate() {
        product.recommendation_only = i < exclusive;
    }
    products.sort_by(|a, b| a.id.cmp(&b.id));
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;
    use drape_core::Category;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn product(id: &str, category: Category) -> Product {
        Product {
            id: id.to_string(),
            category,
            recommendation_only: false,
            image_path: format!("public/products/images/synthetic/{}.jpg", id),
        }
    }

    #[tokio::test]
    async fn loads_catalog_and_metadata() {
        let dir = temp_dir("catalog");
        std::fs::write(
            dir.join("products.yaml"),
            "- id: a1\n  category: apparel\n  image_path: img/a1.jpg\n  recommendation_only: true\n\
             - id: e1\n  category: eyewear\n  image_path: img/e1.jpg\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("products_metadata.yaml"),
            "a1:\n  presentation: Model\ne1:\n  eyewearType: eyeglasses\n",
        )
        .unwrap();

        let catalog = YamlCatalog::new(DataLayout::new(&dir));
        let products = catalog.load_catalog().await.unwrap();
        assert_eq!(products.len(), 2);
        assert!(products[0].recommendation_only);
        assert!(!products[1].recommendation_only);

        let metadata = catalog.load_metadata().await.unwrap();
        assert_eq!(metadata["a1"].presentation.as_deref(), Some("Model"));
        assert_eq!(metadata["e1"].eyewear_type.as_deref(), Some("eyeglasses"));
    }

    #[tokio::test]
    async fn missing_catalog_is_not_found_but_missing_metadata_is_empty() {
        let dir = temp_dir("catalog_missing");
        let catalog = YamlCatalog::new(DataLayout::new(&dir));
        assert!(matches!(
            catalog.load_catalog().await,
            Err(DrapeError::NotFound(_))
        ));
        assert!(catalog.load_metadata().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_products() {
        let dir = temp_dir("catalog_save");
        let catalog = YamlCatalog::new(DataLayout::new(&dir));
        let products = vec![product("a1", Category::Apparel), product("e1", Category::Eyewear)];
        catalog.save_catalog(&products).await.unwrap();
        assert_eq!(catalog.load_catalog().await.unwrap(), products);
    }

    #[test]
    fn reshuffle_marks_a_third_and_sorts() {
        let products: Vec<Product> = (0..10)
            .rev()
            .map(|i| product(&format!("a{:02}", i), Category::Apparel))
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = reshuffle_recommendation_only(products, &mut rng);

        assert_eq!(shuffled.iter().filter(|p| p.recommendation_only).count(), 4);
        let ids: Vec<&str> = shuffled.iter().map(|p| p.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
