//! Webhook authentication middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::web::body::{relay_body, BodyError};
use crate::web::handlers::IngestError;
use crate::web::SourceState;

/// Capture the body once, then verify its signature before running `next`.
///
/// Oversized or unreadable bodies are rejected before any signature work.
/// On success the handler finds the bytes as a [`RawBody`] extension and in
/// the request body.
///
/// [`RawBody`]: crate::web::body::RawBody
pub async fn webhook_auth(
    State(state): State<SourceState>,
    request: Request,
    next: Next,
) -> Result<Response, IngestError> {
    let source = state.source.name();

    let (request, raw) = relay_body(request, state.app.max_body_bytes)
        .await
        .map_err(|err| {
            match &err {
                BodyError::TooLarge { limit } => {
                    warn!(source, limit = *limit, "webhook_body_too_large")
                }
                BodyError::Read(e) => warn!(source, error = %e, "webhook_body_unreadable"),
            }
            err
        })?;

    if let Err(err) = state.source.verifier().verify_headers(request.headers(), raw.as_bytes()) {
        warn!(
            source,
            reason = err.reason(),
            body_length = raw.len(),
            "webhook_signature_invalid"
        );
        return Err(err.into());
    }

    debug!(source, body_length = raw.len(), "webhook_signature_verified");

    Ok(next.run(request).await)
}
