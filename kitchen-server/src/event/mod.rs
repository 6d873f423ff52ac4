//! Webhook event records.
//!
//! [`NewWebhookEvent`] is what the ingest path builds per request;
//! [`WebhookEvent`] is what the store hands back once it has assigned an
//! identity and a receive time.

pub mod extract;

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName};
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub use extract::{extract_event_type, EventTypeSource, UNKNOWN_EVENT_TYPE};

/// Header carrying the caller's correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// An authenticated event that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWebhookEvent {
    /// Logical origin channel, e.g. `custom`.
    pub source: String,
    /// Best-effort classification, `unknown` when indeterminate.
    pub event_type: String,
    /// Raw body exactly as verified.
    pub payload: Bytes,
    /// One value per header name, first occurrence wins.
    pub headers: HashMap<String, String>,
    /// Signature header value as received, prefix included.
    pub signature: String,
    /// Caller supplied correlation id, empty when absent.
    pub request_id: String,
}

/// A persisted webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub id: i64,
    pub source: String,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub signature: String,
    pub request_id: String,
    pub received_at: DateTime<Utc>,
}

/// Flatten a header map to one value per name.
///
/// Names are the lowercase wire names. Only the first value of a repeated
/// header is kept; values that are not UTF-8 are stored lossily.
pub fn snapshot_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut snapshot = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        snapshot
            .entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    snapshot
}

/// First value of `name` as a string, empty when absent.
pub fn header_string(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default()
}
