//! Webhook signature verification.
//!
//! Resend signs webhook deliveries through Svix. Each delivery carries three
//! headers (`svix-id`, `svix-timestamp`, `svix-signature`); the signature is
//! an HMAC-SHA256 over `"{id}.{timestamp}.{payload}"`, keyed with the base64
//! portion of the `whsec_...` signing secret, and base64-encoded.
//! Reference: https://docs.svix.com/receiving/verifying-payloads/how-manual
//!
//! Verification runs over the exact bytes received, before any JSON
//! decoding, and timestamps outside the tolerance window are rejected to
//! block replays of captured deliveries.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

use crate::error::GatewayError;
use crate::event::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Default tolerance for webhook timestamps, in seconds.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 300;

/// The raw signed webhook delivery, prior to verification.
///
/// `payload` must be the byte sequence exactly as received on the wire;
/// re-serializing a parsed body changes the bytes and breaks the signature.
#[derive(Debug)]
pub struct WebhookEnvelope<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("missing webhook header: {0}")]
    MissingHeader(&'static str),

    #[error("signing secret is not valid base64")]
    InvalidSecret,

    #[error("timestamp is not unix seconds")]
    InvalidTimestamp,

    #[error("timestamp outside tolerance window")]
    StaleTimestamp,

    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Verifies webhook envelopes against the shared signing secret.
#[derive(Debug)]
pub struct SignatureVerifier {
    key: Vec<u8>,
    max_age_seconds: u64,
}

impl SignatureVerifier {
    /// Build a verifier from the provider-issued signing secret.
    ///
    /// Accepts the secret with or without its `whsec_` prefix; the remainder
    /// must be base64.
    pub fn new(secret: &str, max_age_seconds: u64) -> Result<Self, VerifyError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64
            .decode(encoded)
            .map_err(|_| VerifyError::InvalidSecret)?;

        Ok(Self {
            key,
            max_age_seconds,
        })
    }

    /// Verify an envelope against the current wall clock.
    pub fn verify(&self, envelope: &WebhookEnvelope<'_>) -> Result<(), VerifyError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.verify_at(envelope, now)
    }

    /// Verify an envelope against an explicit "now", in unix seconds.
    pub fn verify_at(&self, envelope: &WebhookEnvelope<'_>, now: u64) -> Result<(), VerifyError> {
        let timestamp: u64 = envelope
            .timestamp
            .parse()
            .map_err(|_| VerifyError::InvalidTimestamp)?;

        // Reject deliveries too far in either direction.
        let age = if now > timestamp {
            now - timestamp
        } else {
            timestamp - now
        };

        if age > self.max_age_seconds {
            warn!(
                webhook_id = %envelope.id,
                webhook_time = timestamp,
                current_time = now,
                age_seconds = age,
                max_age_seconds = self.max_age_seconds,
                "webhook_timestamp_stale"
            );
            return Err(VerifyError::StaleTimestamp);
        }

        let expected = self.sign(envelope.id, envelope.timestamp, envelope.payload);

        // The header carries space-separated `v1,<base64>` entries; the
        // delivery is valid when any v1 entry matches.
        for entry in envelope.signature.split_whitespace() {
            let Some((version, candidate)) = entry.split_once(',') else {
                continue;
            };
            if version != SIGNATURE_VERSION {
                continue;
            }
            if constant_time_compare(expected.as_bytes(), candidate.as_bytes()) {
                return Ok(());
            }
        }

        warn!(webhook_id = %envelope.id, "webhook_signature_mismatch");
        Err(VerifyError::SignatureMismatch)
    }

    /// Verify an envelope, then decode the event it protects.
    ///
    /// Decoding happens strictly after verification succeeds, over the same
    /// bytes the signature covers.
    pub fn verify_event(
        &self,
        envelope: &WebhookEnvelope<'_>,
    ) -> Result<WebhookEvent, GatewayError> {
        self.verify(envelope)?;

        serde_json::from_slice(envelope.payload)
            .map_err(|e| GatewayError::MalformedRequest(format!("invalid webhook payload: {e}")))
    }

    /// Compute the base64 signature for the given id, timestamp, and payload.
    pub fn sign(&self, id: &str, timestamp: &str, payload: &[u8]) -> String {
        // HMAC accepts keys of any length, so construction cannot fail.
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC key of any length");
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        BASE64.encode(mac.finalize().into_bytes())
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
