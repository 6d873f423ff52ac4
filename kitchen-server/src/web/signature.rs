//! Webhook signature verification.
//!
//! Senders sign the raw request body with a shared secret using HMAC-SHA256
//! and put the hex digest in a header, optionally behind a literal prefix:
//!
//! ```text
//! X-Webhook-Signature: sha256=5d5b09f6dcb2d53a5fffc60c4ac0d55fabdf556069d6631545f42aa6e3500f2e
//! ```

use std::fmt;

use axum::http::{HeaderMap, HeaderName};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default header carrying the signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Default literal prefix in front of the hex digest.
pub const DEFAULT_SIGNATURE_PREFIX: &str = "sha256=";

/// Why a request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The signature header is absent or empty.
    #[error("missing signature")]
    Missing,
    /// The header lacks the configured prefix or is not hex after it.
    #[error("malformed signature")]
    Malformed,
    /// The decoded digest does not match the body.
    #[error("signature mismatch")]
    Mismatch,
}

impl SignatureError {
    /// Stable label for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "missing_signature",
            Self::Malformed => "malformed_signature",
            Self::Mismatch => "signature_mismatch",
        }
    }
}

/// HMAC-SHA256 verifier bound to one secret and one header convention.
///
/// The keyed MAC state is built once and cloned per request, so the raw
/// secret is not retained.
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
    header: HeaderName,
    prefix: String,
}

impl SignatureVerifier {
    /// Create a verifier for `secret`, reading `header` and stripping `prefix`.
    ///
    /// An empty prefix means the header carries bare hex.
    pub fn new(
        secret: &[u8],
        header: HeaderName,
        prefix: impl Into<String>,
    ) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
            header,
            prefix: prefix.into(),
        })
    }

    /// Header this verifier reads the signature from.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Literal prefix expected in front of the hex digest.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Compute the raw HMAC-SHA256 digest of `body`.
    pub fn digest(&self, body: &[u8]) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(body);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&mac.finalize().into_bytes());
        digest
    }

    /// Produce the header value a sender would attach to `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        format!("{}{}", self.prefix, hex::encode(self.digest(body)))
    }

    /// Verify `body` against the signature header found in `headers`.
    ///
    /// A header value that is not visible ASCII cannot be hex and is treated
    /// as malformed.
    pub fn verify_headers(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        match headers.get(&self.header) {
            None => self.verify(None, body),
            Some(value) => match value.to_str() {
                Ok(value) => self.verify(Some(value), body),
                Err(_) => Err(SignatureError::Malformed),
            },
        }
    }

    /// Verify `body` against a raw signature header value.
    ///
    /// Checks run in order: presence, prefix and hex encoding, then a
    /// constant-time comparison of the decoded digest with the expected one.
    /// A decoded digest of the wrong length is a mismatch.
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let signature = match signature {
            Some(value) if !value.is_empty() => value,
            _ => return Err(SignatureError::Missing),
        };

        let encoded = signature
            .strip_prefix(self.prefix.as_str())
            .ok_or(SignatureError::Malformed)?;
        let candidate = hex::decode(encoded).map_err(|_| SignatureError::Malformed)?;

        let expected = self.digest(body);
        if bool::from(expected.as_slice().ct_eq(candidate.as_slice())) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("header", &self.header)
            .field("prefix", &self.prefix)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(secret: &str) -> SignatureVerifier {
        SignatureVerifier::new(
            secret.as_bytes(),
            HeaderName::from_static(DEFAULT_SIGNATURE_HEADER),
            DEFAULT_SIGNATURE_PREFIX,
        )
        .unwrap()
    }

    #[test]
    fn test_verify_signature_valid() {
        let v = verifier("test-secret");
        let body = br#"{"event_type":"test"}"#;

        let signature = v.sign(body);
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), "sha256=".len() + 64);
        assert_eq!(v.verify(Some(&signature), body), Ok(()));
    }

    #[test]
    fn test_verify_signature_matches_reference_digest() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let v = verifier("key");
        let body = b"The quick brown fox jumps over the lazy dog";

        assert_eq!(
            v.sign(body),
            "sha256=f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_verify_signature_body_changed() {
        let v = verifier("test-secret");
        let signature = v.sign(b"original body");

        assert_eq!(
            v.verify(Some(&signature), b"original body!"),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(v.verify(Some(&signature), b""), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_verify_signature_other_secret() {
        let body = b"payload";
        let signature = verifier("secret-a").sign(body);

        assert_eq!(
            verifier("secret-b").verify(Some(&signature), body),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_missing() {
        let v = verifier("test-secret");

        assert_eq!(v.verify(None, b"anything"), Err(SignatureError::Missing));
        assert_eq!(v.verify(Some(""), b"anything"), Err(SignatureError::Missing));
        assert_eq!(v.verify(None, b""), Err(SignatureError::Missing));
    }

    #[test]
    fn test_verify_signature_not_hex() {
        let v = verifier("test-secret");

        assert_eq!(
            v.verify(Some("sha256=not-hex-at-all"), b"body"),
            Err(SignatureError::Malformed)
        );
        // odd number of hex digits
        assert_eq!(v.verify(Some("sha256=abc"), b"body"), Err(SignatureError::Malformed));
    }

    #[test]
    fn test_verify_signature_missing_prefix() {
        let v = verifier("test-secret");
        let bare = hex::encode(v.digest(b"body"));

        assert_eq!(v.verify(Some(&bare), b"body"), Err(SignatureError::Malformed));
        assert_eq!(
            v.verify(Some(&format!("v1={bare}")), b"body"),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_verify_signature_wrong_length() {
        let v = verifier("test-secret");
        let short = format!("sha256={}", hex::encode(b"badsig"));

        assert_eq!(v.verify(Some(&short), b"body"), Err(SignatureError::Mismatch));
        assert_eq!(v.verify(Some("sha256="), b"body"), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_verify_signature_uppercase_hex() {
        let v = verifier("test-secret");
        let upper = format!("sha256={}", hex::encode_upper(v.digest(b"body")));

        assert_eq!(v.verify(Some(&upper), b"body"), Ok(()));
    }

    #[test]
    fn test_verify_signature_empty_prefix() {
        let v = SignatureVerifier::new(b"s3cret", HeaderName::from_static("x-signature"), "")
            .unwrap();
        let signature = v.sign(b"raw");

        assert_eq!(signature.len(), 64);
        assert_eq!(v.verify(Some(&signature), b"raw"), Ok(()));
    }

    #[test]
    fn test_verify_headers() {
        let v = verifier("test-secret");
        let body = b"{}";

        let mut headers = HeaderMap::new();
        assert_eq!(v.verify_headers(&headers, body), Err(SignatureError::Missing));

        headers.insert("x-webhook-signature", v.sign(body).parse().unwrap());
        assert_eq!(v.verify_headers(&headers, body), Ok(()));

        headers.insert(
            "x-webhook-signature",
            axum::http::HeaderValue::from_bytes(b"sha256=\xff\xfe").unwrap(),
        );
        assert_eq!(v.verify_headers(&headers, body), Err(SignatureError::Malformed));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", verifier("super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_signature_error_reason() {
        assert_eq!(SignatureError::Missing.reason(), "missing_signature");
        assert_eq!(SignatureError::Malformed.reason(), "malformed_signature");
        assert_eq!(SignatureError::Mismatch.reason(), "signature_mismatch");
    }
}
