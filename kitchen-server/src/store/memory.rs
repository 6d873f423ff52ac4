//! In-process event store.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{EventStore, StoreError};
use crate::event::{NewWebhookEvent, WebhookEvent};

/// Event store held in memory.
///
/// Ids start at 1 and increase by one per insert. The lock is only held for
/// the duration of a push or a scan, never across an await.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    events: Vec<WebhookEvent>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: &NewWebhookEvent) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().map_err(poisoned)?;

        inner.next_id += 1;
        let id = inner.next_id;
        inner.events.push(WebhookEvent {
            id,
            source: event.source.clone(),
            event_type: event.event_type.clone(),
            payload: event.payload.to_vec(),
            headers: event.headers.clone(),
            signature: event.signature.clone(),
            request_id: event.request_id.clone(),
            received_at: Utc::now(),
        });

        Ok(id)
    }

    async fn list(&self, source: &str, limit: u32) -> Result<Vec<WebhookEvent>, StoreError> {
        let inner = self.inner.lock().map_err(poisoned)?;

        let mut events: Vec<WebhookEvent> = inner
            .events
            .iter()
            .filter(|event| source.is_empty() || event.source == source)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.received_at.cmp(&a.received_at).then(b.id.cmp(&a.id)));
        events.truncate(limit as usize);

        Ok(events)
    }
}
