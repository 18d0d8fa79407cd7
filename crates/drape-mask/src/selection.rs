// crates/drape-mask/src/selection.rs
//
// Base product selection for mask discovery.

use drape_core::{Category, DrapeError, ImageRef, MetadataMap, Product, ProductMetadata};

/// Whether a product's metadata makes it a usable base for `category`.
///
/// Apparel bases must show the garment on a model; eyewear bases must be
/// eyeglasses (not sunglasses).
fn qualifies(category: Category, metadata: Option<&ProductMetadata>) -> bool {
    match category {
        Category::Apparel => metadata
            .and_then(|m| m.presentation.as_deref())
            .is_some_and(|p| p.eq_ignore_ascii_case("model")),
        Category::Eyewear => metadata
            .and_then(|m| m.eyewear_type.as_deref())
            .is_some_and(|t| t == "eyeglasses"),
    }
}

/// Pick the base product for a discovery run.
///
/// With `base_id`, only that product is considered and it must pass every
/// check; no other product is substituted. Otherwise the first product of
/// the category that passes wins.
pub fn select_base<F>(
    category: Category,
    products: &[Product],
    metadata: &MetadataMap,
    base_id: Option<&str>,
    image_exists: F,
) -> Result<Product, DrapeError>
where
    F: Fn(&ImageRef) -> bool,
{
    let candidates: Vec<&Product> = match base_id {
        Some(id) => products.iter().filter(|p| p.id == id).collect(),
        None => products.iter().filter(|p| p.category == category).collect(),
    };

    if candidates.is_empty() {
        return Err(DrapeError::BaseSelection(match base_id {
            Some(id) => format!("no product with id {} for category {}", id, category),
            None => format!("no products found for category {}", category),
        }));
    }

    let chosen = candidates.into_iter().find(|p| {
        !p.id.is_empty()
            && !p.image_path.is_empty()
            && qualifies(category, metadata.get(&p.id))
            && image_exists(&p.image())
    });

    match (chosen, base_id) {
        (Some(product), _) => {
            tracing::info!(category = %category, product_id = %product.id, "Selected base product");
            Ok(product.clone())
        }
        (None, Some(id)) => Err(DrapeError::BaseSelection(format!(
            "base id {} did not meet selection criteria or its image is missing",
            id
        ))),
        (None, None) => Err(DrapeError::BaseSelection(format!(
            "no suitable base product found for category {}",
            category
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, category: Category) -> Product {
        Product {
            id: id.to_string(),
            category,
            recommendation_only: false,
            image_path: format!("img/{}.jpg", id),
        }
    }

    fn fixture() -> (Vec<Product>, MetadataMap) {
        let products = vec![
            product("a1", Category::Apparel),
            product("a2", Category::Apparel),
            product("a3", Category::Apparel),
            product("e1", Category::Eyewear),
            product("e2", Category::Eyewear),
        ];
        let mut metadata = MetadataMap::new();
        metadata.insert(
            "a1".to_string(),
            ProductMetadata {
                presentation: Some("flatlay".to_string()),
                ..Default::default()
            },
        );
        metadata.insert(
            "a2".to_string(),
            ProductMetadata {
                presentation: Some("Model".to_string()),
                ..Default::default()
            },
        );
        metadata.insert(
            "a3".to_string(),
            ProductMetadata {
                presentation: Some("model".to_string()),
                ..Default::default()
            },
        );
        metadata.insert(
            "e1".to_string(),
            ProductMetadata {
                eyewear_type: Some("sunglasses".to_string()),
                ..Default::default()
            },
        );
        metadata.insert(
            "e2".to_string(),
            ProductMetadata {
                eyewear_type: Some("eyeglasses".to_string()),
                ..Default::default()
            },
        );
        (products, metadata)
    }

    #[test]
    fn first_qualifying_candidate_wins() {
        let (products, metadata) = fixture();
        let base = select_base(Category::Apparel, &products, &metadata, None, |_| true).unwrap();
        assert_eq!(base.id, "a2");
        let base = select_base(Category::Eyewear, &products, &metadata, None, |_| true).unwrap();
        assert_eq!(base.id, "e2");
    }

    #[test]
    fn missing_image_is_skipped() {
        let (products, metadata) = fixture();
        let base = select_base(Category::Apparel, &products, &metadata, None, |img| {
            img.as_str() != "img/a2.jpg"
        })
        .unwrap();
        assert_eq!(base.id, "a3");
    }

    #[test]
    fn requested_id_is_strict() {
        let (products, metadata) = fixture();
        let base = select_base(Category::Apparel, &products, &metadata, Some("a3"), |_| true).unwrap();
        assert_eq!(base.id, "a3");

        // a1 exists but is not on a model: no fallback to a2.
        assert!(matches!(
            select_base(Category::Apparel, &products, &metadata, Some("a1"), |_| true),
            Err(DrapeError::BaseSelection(_))
        ));
        assert!(select_base(Category::Apparel, &products, &metadata, Some("zz"), |_| true).is_err());
    }

    #[test]
    fn product_without_metadata_never_qualifies() {
        let products = vec![product("a9", Category::Apparel)];
        assert!(select_base(Category::Apparel, &products, &MetadataMap::new(), None, |_| true).is_err());
    }
}
