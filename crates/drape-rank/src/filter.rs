// crates/drape-rank/src/filter.rs
//
// Category and exclusivity predicates over the catalog.

use drape_core::{Category, Product};

/// Eligibility filter for a ranking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Category,
    /// Keep only `recommendation_only` items.
    pub exclusive_only: bool,
}

impl CatalogFilter {
    pub fn new(category: Category, exclusive_only: bool) -> Self {
        Self {
            category,
            exclusive_only,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        product.category == self.category && (!self.exclusive_only || product.recommendation_only)
    }

    /// Eligible products, in catalog order.
    pub fn apply(&self, catalog: &[Product]) -> Vec<Product> {
        catalog.iter().filter(|p| self.matches(p)).cloned().collect()
    }

    /// The public listing for a category: recommendation-only items hidden.
    pub fn public_listing(catalog: &[Product], category: Category) -> Vec<Product> {
        catalog
            .iter()
            .filter(|p| p.category == category && !p.recommendation_only)
            .cloned()
            .collect()
    }
}
