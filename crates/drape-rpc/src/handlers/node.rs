// crates/drape-rpc/src/handlers/node.rs
//
// Node health handler: GetHealth.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use drape_core::Category;
use drape_rank::Recommender;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHealthRequest {}

/// Node health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHealthResponse {
    /// "healthy" or "degraded".
    pub status: String,
    /// Software version.
    pub version: String,
    pub uptime_seconds: u64,
    /// Catalog and event log both readable.
    pub storage_ok: bool,
    /// Publicly listed products across all categories.
    pub catalog_size: usize,
    pub event_count: usize,
    pub window_size: usize,
    pub result_limit: usize,
    pub mask_weighting: bool,
    /// Human-readable details.
    pub details: Option<String>,
}

/// Handle a GetHealth request. Storage failures degrade the status rather
/// than failing the call.
pub async fn handle_get_health(
    recommender: &Recommender,
    _request: GetHealthRequest,
    start_time: Option<Instant>,
) -> Result<GetHealthResponse, String> {
    let mut problems = Vec::new();

    let mut catalog_size = 0;
    for category in Category::ALL {
        match recommender.catalog(category).await {
            Ok(products) => catalog_size += products.len(),
            Err(e) => problems.push(format!("catalog: {}", e)),
        }
    }

    let event_count = match recommender.list_events().await {
        Ok(events) => events.len(),
        Err(e) => {
            problems.push(format!("events: {}", e));
            0
        }
    };

    let storage_ok = problems.is_empty();
    let config = recommender.config();
    Ok(GetHealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0),
        storage_ok,
        catalog_size,
        event_count,
        window_size: config.window_size,
        result_limit: config.result_limit,
        mask_weighting: config.mask_weighting,
        details: if storage_ok { None } else { Some(problems.join("; ")) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::recommender;

    #[tokio::test]
    async fn reports_healthy_in_memory_node() {
        let resp = handle_get_health(&recommender(), GetHealthRequest {}, Some(Instant::now()))
            .await
            .unwrap();
        assert_eq!(resp.status, "healthy");
        assert!(resp.storage_ok);
        assert_eq!(resp.catalog_size, 3);
        assert_eq!(resp.event_count, 0);
        assert_eq!(resp.result_limit, 6);
        assert!(resp.details.is_none());
    }
}
