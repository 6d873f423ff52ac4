//! HTTP surface for webhook ingestion.
//!
//! Each configured source gets `POST /webhooks/{source}/` (with or without the
//! trailing slash) behind its own [`webhook_auth`] layer:
//!
//! ```text
//! request → relay_body → verify signature → ingest_webhook → EventStore
//! ```

pub mod auth;
pub mod body;
pub mod handlers;
pub mod signature;
pub mod source;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::store::EventStore;

pub use auth::webhook_auth;
pub use body::{relay_body, BodyError, RawBody, DEFAULT_MAX_BODY_BYTES};
pub use handlers::{health, ingest_webhook, HealthResponse, IngestError};
pub use signature::{SignatureError, SignatureVerifier};
pub use source::{SourceError, WebhookSource};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, max_body_bytes: usize) -> Self {
        Self {
            store,
            max_body_bytes,
        }
    }
}

/// State seen by one source's routes.
#[derive(Clone)]
pub struct SourceState {
    pub app: AppState,
    pub source: Arc<WebhookSource>,
}

/// Build the router for `sources`.
///
/// # Panics
///
/// Panics if two sources share a name, as their routes would overlap.
pub fn build_router(state: AppState, sources: Vec<WebhookSource>) -> Router {
    let mut router = Router::new().route("/health", get(health));

    for source in sources {
        let path = source.path();
        let state = SourceState {
            app: state.clone(),
            source: Arc::new(source),
        };

        let endpoint = post(ingest_webhook)
            .route_layer(middleware::from_fn_with_state(state.clone(), webhook_auth))
            .with_state(state);

        let routes: Router = Router::new()
            .route(&path, endpoint.clone())
            .route(path.trim_end_matches('/'), endpoint);

        router = router.merge(routes);
    }

    router.layer(TraceLayer::new_for_http())
}
