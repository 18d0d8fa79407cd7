// crates/drape-rpc/src/handlers/events.rs
//
// Interaction event handlers: RecordEvent, ListEvents, ClearEvents.

use serde::{Deserialize, Serialize};

use drape_core::{InteractionEvent, NewEvent};
use drape_rank::Recommender;

// ---------------------------------------------------------------------------
// RecordEvent
// ---------------------------------------------------------------------------

/// Request to append an interaction to the log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    /// Action tag, e.g. "like".
    #[serde(default)]
    pub action: Option<String>,
}

/// The event as stored, with its timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventResponse {
    pub event: InteractionEvent,
}

/// Handle a RecordEvent request. Both `productId` and `action` are required.
pub async fn handle_record_event(
    recommender: &Recommender,
    request: RecordEventRequest,
) -> Result<RecordEventResponse, String> {
    let (product_id, action) = match (request.product_id, request.action) {
        (Some(product_id), Some(action)) => (product_id, action),
        _ => return Err("productId and action are required".to_string()),
    };

    let event = recommender
        .record_event(NewEvent::new(product_id, action))
        .await
        .map_err(|e| format!("Failed to record event: {}", e))?;

    Ok(RecordEventResponse { event })
}

// ---------------------------------------------------------------------------
// ListEvents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEventsRequest {}

/// Every logged event, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsResponse {
    pub events: Vec<InteractionEvent>,
    pub count: usize,
}

pub async fn handle_list_events(
    recommender: &Recommender,
    _request: ListEventsRequest,
) -> Result<ListEventsResponse, String> {
    let events = recommender
        .list_events()
        .await
        .map_err(|e| format!("Failed to list events: {}", e))?;

    Ok(ListEventsResponse {
        count: events.len(),
        events,
    })
}

// ---------------------------------------------------------------------------
// ClearEvents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearEventsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearEventsResponse {
    pub cleared: bool,
}

/// Handle a ClearEvents request. Resets the preference to cold start.
pub async fn handle_clear_events(
    recommender: &Recommender,
    _request: ClearEventsRequest,
) -> Result<ClearEventsResponse, String> {
    recommender
        .clear_events()
        .await
        .map_err(|e| format!("Failed to clear events: {}", e))?;

    Ok(ClearEventsResponse { cleared: true })
}
