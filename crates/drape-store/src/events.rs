// crates/drape-store/src/events.rs
//
// JSON-file interaction log (`events.json`, a JSON array in insertion order).
//
// The log is single-user and append-only. Writers are serialized by an
// in-process async mutex and each write replaces the file atomically, so a
// reader never observes a half-written array.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use drape_core::traits::EventLog;
use drape_core::{DrapeError, InteractionEvent, NewEvent};

use crate::layout::{read_optional, write_atomic, DataLayout};

/// Event log persisted as a JSON array.
#[derive(Debug)]
pub struct JsonEventLog {
    layout: DataLayout,
    write_lock: Mutex<()>,
}

impl JsonEventLog {
    pub fn new(layout: DataLayout) -> Self {
        Self {
            layout,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the log. A missing file is an empty log; a malformed file is an
    /// error so that the next append cannot silently discard history.
    async fn read_events(&self) -> Result<Vec<InteractionEvent>, DrapeError> {
        match read_optional(&self.layout.events_path()).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_events(&self, events: &[InteractionEvent]) -> Result<(), DrapeError> {
        let json = serde_json::to_vec_pretty(events)?;
        write_atomic(&self.layout.events_path(), &json).await
    }
}

#[async_trait]
impl EventLog for JsonEventLog {
    async fn append(&self, event: NewEvent) -> Result<InteractionEvent, DrapeError> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.read_events().await?;
        let stored = event.at(Utc::now());
        events.push(stored.clone());
        self.write_events(&events).await?;
        tracing::debug!(
            product_id = %stored.product_id,
            action = %stored.action,
            total = events.len(),
            "Appended interaction event"
        );
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<InteractionEvent>, DrapeError> {
        self.read_events().await
    }

    async fn clear(&self) -> Result<(), DrapeError> {
        let _guard = self.write_lock.lock().await;
        self.write_events(&[]).await?;
        tracing::info!("Cleared interaction log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;
    use std::sync::Arc;

    #[tokio::test]
    async fn append_list_clear() {
        let dir = temp_dir("events");
        let log = JsonEventLog::new(DataLayout::new(&dir));
        assert!(log.list().await.unwrap().is_empty());

        log.append(NewEvent::like("a1")).await.unwrap();
        log.append(NewEvent::new("a2", "view")).await.unwrap();
        let events = log.list().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].product_id, "a1");
        assert!(events[0].timestamp <= events[1].timestamp);

        log.clear().await.unwrap();
        assert!(log.list().await.unwrap().is_empty());
        // Clearing leaves an empty array on disk.
        let raw = std::fs::read_to_string(dir.join("events.json")).unwrap();
        assert_eq!(raw.trim(), "[]");
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let dir = temp_dir("events_concurrent");
        let log = Arc::new(JsonEventLog::new(DataLayout::new(&dir)));

        let mut handles = Vec::new();
        for i in 0..16 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(NewEvent::like(format!("p{}", i))).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(log.list().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn malformed_log_is_an_error() {
        let dir = temp_dir("events_bad");
        std::fs::write(dir.join("events.json"), "{not json").unwrap();
        let log = JsonEventLog::new(DataLayout::new(&dir));
        assert!(matches!(log.list().await, Err(DrapeError::Serialization(_))));
        assert!(log.append(NewEvent::like("a1")).await.is_err());
    }
}
