//! Durable storage for received webhook events.
//!
//! The store is append-only. It assigns `id` and `received_at` on insert and
//! lists newest-first. [`PgEventStore`] is the production backend;
//! [`MemoryEventStore`] backs tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::{NewWebhookEvent, WebhookEvent};

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// Storage failure. Callers must not acknowledge the webhook.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("header encoding error: {0}")]
    Headers(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only event persistence.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist `event`, returning its assigned id.
    async fn insert(&self, event: &NewWebhookEvent) -> Result<i64, StoreError>;

    /// Up to `limit` most recent events, newest first.
    ///
    /// An empty `source` lists every source.
    async fn list(&self, source: &str, limit: u32) -> Result<Vec<WebhookEvent>, StoreError>;
}
