//! Postgres event store.
//!
//! Expects the `webhook_events` table from
//! `migrations/0001_create_webhook_events.sql`. Identity comes from the
//! `BIGSERIAL` sequence and `received_at` from the column default, so
//! concurrent inserts never race on either.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use super::{EventStore, StoreError};
use crate::event::{NewWebhookEvent, WebhookEvent};

/// Event store over a shared Postgres pool.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    source: String,
    event_type: String,
    payload: Vec<u8>,
    headers: serde_json::Value,
    signature: String,
    request_id: String,
    received_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for WebhookEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let headers: HashMap<String, String> = serde_json::from_value(row.headers)?;
        Ok(WebhookEvent {
            id: row.id,
            source: row.source,
            event_type: row.event_type,
            payload: row.payload,
            headers,
            signature: row.signature,
            request_id: row.request_id,
            received_at: row.received_at,
        })
    }
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &NewWebhookEvent) -> Result<i64, StoreError> {
        let headers = serde_json::to_value(&event.headers)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO webhook_events (source, event_type, payload, headers, signature, request_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&event.source)
        .bind(&event.event_type)
        .bind(event.payload.as_ref())
        .bind(headers)
        .bind(&event.signature)
        .bind(&event.request_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(id, source = %event.source, "webhook_event_inserted");

        Ok(id)
    }

    async fn list(&self, source: &str, limit: u32) -> Result<Vec<WebhookEvent>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, source, event_type, payload, headers, signature, request_id, received_at
            FROM webhook_events
            WHERE ($1 = '' OR source = $1)
            ORDER BY received_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(source)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WebhookEvent::try_from).collect()
    }
}
