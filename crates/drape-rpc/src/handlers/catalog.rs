// crates/drape-rpc/src/handlers/catalog.rs
//
// Catalog handlers: ListCatalog.

use serde::{Deserialize, Serialize};

use drape_core::{Category, Product};
use drape_rank::Recommender;

use super::parse_category;

/// Request for the public catalog of one category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCatalogRequest {
    /// "apparel" or "eyewear"; defaults to apparel.
    #[serde(default)]
    pub category: Option<String>,
}

/// Products visible in the public listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCatalogResponse {
    pub category: Category,
    pub products: Vec<Product>,
    pub count: usize,
}

/// Handle a ListCatalog request. Recommendation-only products are hidden.
pub async fn handle_list_catalog(
    recommender: &Recommender,
    request: ListCatalogRequest,
) -> Result<ListCatalogResponse, String> {
    let category = parse_category(request.category.as_deref())?;
    let products = recommender
        .catalog(category)
        .await
        .map_err(|e| format!("Failed to load catalog: {}", e))?;

    Ok(ListCatalogResponse {
        category,
        count: products.len(),
        products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::recommender;

    #[tokio::test]
    async fn lists_public_products_of_the_category() {
        let resp = handle_list_catalog(&recommender(), ListCatalogRequest::default())
            .await
            .unwrap();
        assert_eq!(resp.category, Category::Apparel);
        let ids: Vec<&str> = resp.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
        assert_eq!(resp.count, 2);
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let request = ListCatalogRequest {
            category: Some("shoes".to_string()),
        };
        assert!(handle_list_catalog(&recommender(), request).await.is_err());
    }
}
