//! Webhook endpoint handlers.
//!
//! By the time [`ingest_webhook`] runs, [`webhook_auth`] has captured the body
//! and verified its signature. The handler only classifies and persists.
//!
//! [`webhook_auth`]: crate::web::auth::webhook_auth

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::event::{header_string, snapshot_headers, NewWebhookEvent, REQUEST_ID_HEADER};
use crate::store::StoreError;
use crate::web::body::{BodyError, RawBody};
use crate::web::signature::SignatureError;
use crate::web::SourceState;

/// Why an ingest request was not acknowledged.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] SignatureError),

    #[error("failed to save event")]
    Storage(#[from] StoreError),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Body(BodyError::TooLarge { .. }) => "request body too large".to_string(),
            Self::Body(BodyError::Read(_)) => "request body unreadable".to_string(),
            other => other.to_string(),
        };
        (self.status(), message).into_response()
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Webhook Ingest
// =============================================================================

/// Persist an authenticated webhook and acknowledge it with an empty `200`.
///
/// The stored payload is the exact byte sequence the signature covered.
pub async fn ingest_webhook(
    State(state): State<SourceState>,
    Extension(raw): Extension<RawBody>,
    headers: HeaderMap,
) -> Result<StatusCode, IngestError> {
    let source = &state.source;
    let request_id = header_string(&headers, &HeaderName::from_static(REQUEST_ID_HEADER));

    let event = NewWebhookEvent {
        source: source.name().to_string(),
        event_type: source.event_type().extract(&headers, raw.as_bytes()),
        payload: raw.0.clone(),
        headers: snapshot_headers(&headers),
        signature: header_string(&headers, source.verifier().header()),
        request_id,
    };

    info!(
        source = %event.source,
        event_type = %event.event_type,
        request_id = %event.request_id,
        body_length = event.payload.len(),
        "webhook_received"
    );

    let id = state.app.store.insert(&event).await.map_err(|e| {
        error!(
            source = %event.source,
            request_id = %event.request_id,
            error = %e,
            "webhook_store_failed"
        );
        e
    })?;

    info!(
        id,
        source = %event.source,
        event_type = %event.event_type,
        "webhook_event_stored"
    );

    Ok(StatusCode::OK)
}
