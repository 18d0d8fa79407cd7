// crates/drape-core/src/event.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only action tag that contributes to the preference vector.
pub const LIKE_ACTION: &str = "like";

/// A recorded user interaction. The log is append-only and belongs to a
/// single anonymous user; events are never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// Product the user interacted with.
    pub product_id: String,
    /// Action tag (e.g., "like", "view"). Non-like tags are kept but ignored
    /// by ranking.
    pub action: String,
    /// When the event was appended to the log.
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    /// Whether this event is a positive preference signal.
    pub fn is_like(&self) -> bool {
        self.action == LIKE_ACTION
    }
}

/// An event as submitted by a caller, before the log stamps it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub product_id: String,
    pub action: String,
}

impl NewEvent {
    pub fn new(product_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            action: action.into(),
        }
    }

    pub fn like(product_id: impl Into<String>) -> Self {
        Self::new(product_id, LIKE_ACTION)
    }

    /// Stamp the event with the given append time.
    pub fn at(self, timestamp: DateTime<Utc>) -> InteractionEvent {
        InteractionEvent {
            product_id: self.product_id,
            action: self.action,
            timestamp,
        }
    }
}
