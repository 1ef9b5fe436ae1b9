//! Continuation token issuance and verification.
//!
//! One token per job, generated at creation and reused across every step
//! of the chain ("sticky"), as opposed to a token re-derived per request.
//! A re-derived token would expire before a large purge finishes; a stored
//! token checked by equality removes that failure mode at the cost of a
//! slightly longer replay window, mitigated by the token matching only the
//! one active job.
//!
//! The persisted record stores only the SHA-256 hash of the secret; the
//! raw secret exists solely in continuation triggers.

use base64::Engine;
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::models::ContinuationToken;

/// Purpose bound to step tokens.
pub const STEP_TOKEN_PURPOSE: &str = "purge-step";

/// Issues and verifies the per-job continuation credential.
#[derive(Debug, Clone)]
pub struct ContinuationTokenIssuer {
    ttl: Duration,
}

impl ContinuationTokenIssuer {
    /// TTL is measured in hours: long enough to span a multi-hour purge.
    pub fn new(ttl_hours: u64) -> Self {
        Self {
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    /// Generate a fresh token bound to `purpose`.
    ///
    /// Returns the raw secret (handed to the operator in the continuation
    /// trigger, never persisted) and the storable token record.
    pub fn issue(&self, purpose: &str) -> (String, ContinuationToken) {
        // 32 random bytes (256 bits of entropy), URL-safe for use in
        // continuation triggers.
        let mut rng = rand::thread_rng();
        let mut random_bytes = [0u8; 32];
        rng.fill(&mut random_bytes);

        let secret = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);
        let issued_at = Utc::now();

        let token = ContinuationToken {
            secret_hash: hash_secret(&secret),
            purpose: purpose.to_string(),
            issued_at,
            expires_at: issued_at + self.ttl,
        };
        (secret, token)
    }

    /// Verify a presented secret against the stored token.
    ///
    /// The comparison is against the stored value in constant time, never a
    /// time-based recomputation: the token is compared literally, so a
    /// long-running chain cannot hit a short derivation-window expiry.
    pub fn verify(&self, presented: &str, stored: &ContinuationToken, purpose: &str) -> bool {
        let computed = hash_secret(presented);
        let hash_matches: bool = computed
            .as_bytes()
            .ct_eq(stored.secret_hash.as_bytes())
            .into();
        hash_matches && stored.purpose == purpose && Utc::now() < stored.expires_at
    }
}

/// Hex-encoded SHA-256 of a token secret.
fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
