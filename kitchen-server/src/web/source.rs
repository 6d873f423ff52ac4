//! Per-source webhook settings.

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::{Config, CUSTOM_SOURCE};
use crate::event::EventTypeSource;
use crate::web::signature::{SignatureVerifier, DEFAULT_SIGNATURE_HEADER, DEFAULT_SIGNATURE_PREFIX};

/// Invalid source definition.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source name {0:?}: use lowercase letters, digits, '-' or '_'")]
    InvalidName(String),

    #[error("no secret configured for source {0:?}")]
    MissingSecret(String),

    #[error("secret for source {0:?} cannot key HMAC-SHA256")]
    InvalidSecret(String),
}

/// A webhook origin with its own secret, signature convention and
/// classification strategy. Served at `/webhooks/{name}/`.
#[derive(Debug, Clone)]
pub struct WebhookSource {
    name: String,
    verifier: SignatureVerifier,
    event_type: EventTypeSource,
}

impl WebhookSource {
    pub fn new(
        name: impl Into<String>,
        secret: &str,
        signature_header: HeaderName,
        signature_prefix: &str,
        event_type: EventTypeSource,
    ) -> Result<Self, SourceError> {
        let name = name.into();
        let valid_name = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
        if !valid_name {
            return Err(SourceError::InvalidName(name));
        }
        if secret.is_empty() {
            return Err(SourceError::MissingSecret(name));
        }

        let verifier = SignatureVerifier::new(secret.as_bytes(), signature_header, signature_prefix)
            .map_err(|_| SourceError::InvalidSecret(name.clone()))?;

        Ok(Self { name, verifier, event_type })
    }

    /// The generic source: `X-Webhook-Signature: sha256=<hex>` and a JSON
    /// `event_type` field.
    pub fn custom(secret: &str) -> Result<Self, SourceError> {
        Self::new(
            CUSTOM_SOURCE,
            secret,
            HeaderName::from_static(DEFAULT_SIGNATURE_HEADER),
            DEFAULT_SIGNATURE_PREFIX,
            EventTypeSource::default(),
        )
    }

    /// Build every source the configuration enables.
    pub fn from_config(config: &Config) -> Result<Vec<Self>, SourceError> {
        let secret = config
            .webhook_secrets
            .get(CUSTOM_SOURCE)
            .ok_or_else(|| SourceError::MissingSecret(CUSTOM_SOURCE.to_string()))?;

        Ok(vec![Self::custom(secret)?])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub fn event_type(&self) -> &EventTypeSource {
        &self.event_type
    }

    /// Route path for this source.
    pub fn path(&self) -> String {
        format!("/webhooks/{}/", self.name)
    }
}
