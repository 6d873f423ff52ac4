//! Request body capture.
//!
//! Network bodies can be read once. [`relay_body`] drains the stream up to a
//! size ceiling, stores the bytes in the request extensions as [`RawBody`] and
//! puts a fresh body over the same bytes back on the request, so both the
//! signature check and the handler see exactly what arrived on the wire.

use axum::body::Body;
use axum::extract::Request;
use axum::BoxError;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

/// Default ceiling for captured bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1 << 20;

/// Raw request body bytes captured before authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBody(pub Bytes);

impl RawBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Failure to capture the request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("request body unreadable: {0}")]
    Read(#[source] BoxError),
}

/// Read the body of `request` once, bounded by `limit` bytes.
///
/// Returns the request with its body replaced by a reader over the captured
/// bytes and [`RawBody`] inserted into its extensions.
pub async fn relay_body(request: Request, limit: usize) -> Result<(Request, RawBody), BodyError> {
    let (mut parts, body) = request.into_parts();

    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.is::<LengthLimitError>() => return Err(BodyError::TooLarge { limit }),
        Err(err) => return Err(BodyError::Read(err)),
    };

    let raw = RawBody(bytes.clone());
    parts.extensions.insert(raw.clone());

    Ok((Request::from_parts(parts, Body::from(bytes)), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: impl Into<Body>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/webhooks/custom/")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_relay_body_captures_and_replays() {
        let payload = br#"{"event_type":"test"}"#.to_vec();

        let (request, raw) = relay_body(request(payload.clone()), DEFAULT_MAX_BODY_BYTES)
            .await
            .unwrap();

        assert_eq!(raw.as_bytes(), payload.as_slice());
        assert_eq!(request.extensions().get::<RawBody>(), Some(&raw));

        let replayed = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(replayed.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn test_relay_body_empty() {
        let (_, raw) = relay_body(request(Body::empty()), DEFAULT_MAX_BODY_BYTES)
            .await
            .unwrap();
        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn test_relay_body_at_limit() {
        let (_, raw) = relay_body(request(vec![b'a'; 16]), 16).await.unwrap();
        assert_eq!(raw.len(), 16);
    }

    #[tokio::test]
    async fn test_relay_body_too_large() {
        let err = relay_body(request(vec![b'a'; 17]), 16).await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn test_relay_body_stream_error() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));

        let err = relay_body(request(body), DEFAULT_MAX_BODY_BYTES)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::Read(_)));
    }
}
