//! Signature check run on every inbound interaction before any state access.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Header carrying the lowercase hex signature.
pub const SIGNATURE_HEADER: &str = "x-signature-sha256";
/// Header carrying the unix timestamp (seconds) the signature was made at.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";
/// Largest accepted distance between the request timestamp and now, in seconds.
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

const SECRET_ENV: &str = "INTERACTION_SECRET";

/// Decides whether raw request bytes were produced by the trusted platform.
pub trait RequestVerifier: Send + Sync {
    /// True when `signature` authenticates `timestamp` and `body`.
    fn verify(&self, body: &[u8], signature: &str, timestamp: &str) -> bool;
}

/// Verifier sharing a secret with the platform:
/// `signature = hex(sha256(secret || timestamp || body))`.
pub struct SharedSecretVerifier {
    secret: Vec<u8>,
}

impl SharedSecretVerifier {
    /// Verifier keyed by `secret`.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Signature the platform is expected to send for `body` at `timestamp`.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(timestamp.as_bytes());
        hasher.update(body);
        hex::encode(hasher.finalize())
    }

    fn verify_at(&self, body: &[u8], signature: &str, timestamp: &str, now: i64) -> bool {
        let Ok(sent_at) = timestamp.trim().parse::<i64>() else {
            debug!("signature timestamp is not a unix time");
            return false;
        };
        if (now - sent_at).abs() > MAX_CLOCK_SKEW_SECS {
            debug!(sent_at, now, "signature timestamp outside accepted window");
            return false;
        }

        let expected = self.sign(timestamp, body);
        constant_time_eq(
            expected.as_bytes(),
            signature.trim().to_ascii_lowercase().as_bytes(),
        )
    }
}

impl RequestVerifier for SharedSecretVerifier {
    fn verify(&self, body: &[u8], signature: &str, timestamp: &str) -> bool {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.verify_at(body, signature, timestamp, now)
    }
}

/// Verifier used when no secret is configured.
pub struct RejectAllVerifier;

impl RequestVerifier for RejectAllVerifier {
    fn verify(&self, _body: &[u8], _signature: &str, _timestamp: &str) -> bool {
        false
    }
}

/// Build the verifier from `INTERACTION_SECRET`; without it every request is refused.
pub fn verifier_from_env() -> Arc<dyn RequestVerifier> {
    match std::env::var(SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => Arc::new(SharedSecretVerifier::new(secret)),
        _ => {
            warn!("INTERACTION_SECRET is not set; all interactions will be rejected");
            Arc::new(RejectAllVerifier)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
