// crates/drape-rpc/src/handlers/recommend.rs
//
// Recommendation handlers: Rank.

use serde::{Deserialize, Serialize};

use drape_core::{Category, ScoredProduct};
use drape_rank::{RankOptions, Recommender};

use super::parse_category;

/// Request for ranked recommendations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    /// "apparel" or "eyewear"; defaults to apparel.
    #[serde(default)]
    pub category: Option<String>,
    /// Restrict results to recommendation-only products.
    #[serde(default)]
    pub recommendation_only: Option<bool>,
    /// Overrides the server's result limit.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Ranked products, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub category: Category,
    pub recommendations: Vec<ScoredProduct>,
    pub count: usize,
}

/// Handle a Rank request.
pub async fn handle_rank(recommender: &Recommender, request: RankRequest) -> Result<RankResponse, String> {
    let category = parse_category(request.category.as_deref())?;
    let options = RankOptions::new(category)
        .exclusive_only(request.recommendation_only.unwrap_or(false))
        .limit(request.limit);

    let recommendations = recommender
        .recommend(options)
        .await
        .map_err(|e| format!("Failed to rank products: {}", e))?;

    Ok(RankResponse {
        category,
        count: recommendations.len(),
        recommendations,
    })
}
