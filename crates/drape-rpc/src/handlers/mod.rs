// crates/drape-rpc/src/handlers/mod.rs
//
// Handler modules for the RPC endpoints. Each module defines its request
// and response types and the handler functions for one API group.

pub mod catalog;
pub mod events;
pub mod mask;
pub mod node;
pub mod recommend;

use drape_core::Category;

/// Parse an optional wire category, defaulting to apparel.
pub(crate) fn parse_category(category: Option<&str>) -> Result<Category, String> {
    match category {
        Some(raw) => raw.parse().map_err(|e: drape_core::DrapeError| e.to_string()),
        None => Ok(Category::default()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_defaults_to_apparel() {
        assert_eq!(parse_category(None).unwrap(), Category::Apparel);
        assert_eq!(parse_category(Some("Eyewear")).unwrap(), Category::Eyewear);
        assert!(parse_category(Some("shoes")).unwrap_err().contains("unknown category"));
    }
}
