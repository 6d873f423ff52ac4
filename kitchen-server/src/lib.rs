//! Kitchen - authenticated webhook ingestion.
//!
//! This library provides the modules shared by the two Kitchen binaries:
//! - `kitchen-web`: HTTP server that verifies and stores inbound webhooks
//! - `kitchen-events`: operator tool listing recently stored events
//!
//! ## Architecture
//!
//! ```text
//! Sender → POST /webhooks/{source}/ → body capture → HMAC check → EventStore
//! ```

pub mod config;
pub mod event;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, LogFormat};
pub use event::{extract_event_type, EventTypeSource, NewWebhookEvent, WebhookEvent};
pub use store::{EventStore, MemoryEventStore, PgEventStore, StoreError};
pub use web::{build_router, AppState, SignatureVerifier, WebhookSource};
