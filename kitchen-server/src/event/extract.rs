//! Best-effort event type classification.
//!
//! Extraction never fails a request: anything inconclusive becomes
//! [`UNKNOWN_EVENT_TYPE`].

use axum::http::{HeaderMap, HeaderName};
use serde_json::Value;

/// Classification used when the event type cannot be determined.
pub const UNKNOWN_EVENT_TYPE: &str = "unknown";

/// JSON field read by default.
pub const DEFAULT_EVENT_TYPE_FIELD: &str = "event_type";

/// Where a source carries its event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTypeSource {
    /// Top-level string field of a JSON object body.
    JsonField(String),
    /// Request header, e.g. `x-github-event`.
    Header(HeaderName),
}

impl Default for EventTypeSource {
    fn default() -> Self {
        Self::JsonField(DEFAULT_EVENT_TYPE_FIELD.to_string())
    }
}

impl EventTypeSource {
    /// Classify a request, falling back to `unknown`.
    pub fn extract(&self, headers: &HeaderMap, body: &[u8]) -> String {
        let found = match self {
            Self::JsonField(field) => json_string_field(body, field),
            Self::Header(name) => headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        };
        found.unwrap_or_else(|| UNKNOWN_EVENT_TYPE.to_string())
    }
}

/// Read the `event_type` field of a JSON body.
pub fn extract_event_type(body: &[u8]) -> String {
    json_string_field(body, DEFAULT_EVENT_TYPE_FIELD)
        .unwrap_or_else(|| UNKNOWN_EVENT_TYPE.to_string())
}

// Arrays and scalars have no fields, so they classify like a missing field.
fn json_string_field(body: &[u8], field: &str) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_event_type() {
        let cases: &[(&str, &[u8], &str)] = &[
            ("valid field", br#"{"event_type":"order.created","data":{}}"#, "order.created"),
            ("bare field", br#"{"event_type":"order.created"}"#, "order.created"),
            ("missing field", br#"{"data":{}}"#, "unknown"),
            ("invalid json", b"not json", "unknown"),
            ("empty body", b"", "unknown"),
            ("empty string", br#"{"event_type":""}"#, "unknown"),
            ("number", br#"{"event_type":42}"#, "unknown"),
            ("null", br#"{"event_type":null}"#, "unknown"),
            ("array body", br#"[{"event_type":"x"}]"#, "unknown"),
            ("scalar body", br#""event_type""#, "unknown"),
            ("nested only", br#"{"data":{"event_type":"inner"}}"#, "unknown"),
            ("truncated", br#"{"event_type":"order.created""#, "unknown"),
        ];

        for (name, body, expected) in cases {
            assert_eq!(extract_event_type(body), *expected, "case: {name}");
        }
    }

    #[test]
    fn test_extract_event_type_verbatim() {
        assert_eq!(
            extract_event_type(r#"{"event_type":"  Order Created é "}"#.as_bytes()),
            "  Order Created \u{e9} "
        );
    }

    #[test]
    fn test_json_field_source() {
        let source = EventTypeSource::JsonField("type".to_string());
        let headers = HeaderMap::new();

        assert_eq!(source.extract(&headers, br#"{"type":"invoice.paid"}"#), "invoice.paid");
        assert_eq!(source.extract(&headers, br#"{"event_type":"x"}"#), "unknown");
    }

    #[test]
    fn test_header_source() {
        let source = EventTypeSource::Header(HeaderName::from_static("x-github-event"));
        let mut headers = HeaderMap::new();

        assert_eq!(source.extract(&headers, b"{}"), "unknown");

        headers.insert("x-github-event", HeaderValue::from_static(""));
        assert_eq!(source.extract(&headers, b"{}"), "unknown");

        headers.insert("x-github-event", HeaderValue::from_static("push"));
        assert_eq!(source.extract(&headers, b"{}"), "push");
    }

    #[test]
    fn test_default_source_reads_event_type() {
        let source = EventTypeSource::default();
        assert_eq!(
            source.extract(&HeaderMap::new(), br#"{"event_type":"test"}"#),
            "test"
        );
    }
}
