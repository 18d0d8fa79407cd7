// crates/drape-rpc/src/handlers/mask.rs
//
// Variance mask handlers: GetMask.

use serde::{Deserialize, Serialize};

use drape_core::{Category, VarianceMask};
use drape_rank::Recommender;

use super::parse_category;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMaskRequest {
    #[serde(default)]
    pub category: Option<String>,
}

/// The stored mask, or `null` if discovery has not run for the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMaskResponse {
    pub category: Category,
    pub mask: Option<VarianceMask>,
    /// Whether the server applies masks when ranking.
    pub applied: bool,
}

pub async fn handle_get_mask(recommender: &Recommender, request: GetMaskRequest) -> Result<GetMaskResponse, String> {
    let category = parse_category(request.category.as_deref())?;
    let mask = recommender
        .mask(category)
        .await
        .map_err(|e| format!("Failed to load mask: {}", e))?;

    Ok(GetMaskResponse {
        category,
        mask,
        applied: recommender.config().mask_weighting,
    })
}
