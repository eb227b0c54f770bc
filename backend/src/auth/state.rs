//! Signed `state` values for the OAuth round trip.
//!
//! The login route mints a short-lived HS256 token, stores it in a cookie and
//! sends it to Google as `state`. The callback accepts the grant only when
//! the value Google echoes back matches the cookie and still verifies.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::AuthError;

/// How long a login attempt may take before the state expires.
pub const STATE_TTL_SECS: i64 = 600;

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    nonce: String,
    exp: u64,
    iat: u64,
}

/// Signs and verifies OAuth state tokens with the session secret.
pub struct StateSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl StateSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a fresh state token.
    pub fn issue(&self) -> Result<String, AuthError> {
        self.issue_with_ttl(Duration::seconds(STATE_TTL_SECS))
    }

    fn issue_with_ttl(&self, ttl: Duration) -> Result<String, AuthError> {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        let now = Utc::now();
        let claims = StateClaims {
            nonce: hex::encode(nonce),
            exp: (now + ttl).timestamp().max(0) as u64,
            iat: now.timestamp() as u64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidState(e.to_string()))
    }

    /// Check the state Google echoed back against the one stored in the cookie.
    pub fn verify(&self, returned: &str, expected: Option<&str>) -> Result<(), AuthError> {
        let expected = expected.ok_or(AuthError::StateMismatch)?;
        if returned != expected {
            return Err(AuthError::StateMismatch);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        decode::<StateClaims>(returned, &self.decoding_key, &validation)
            .map(|_| ())
            .map_err(|e| AuthError::InvalidState(e.to_string()))
    }
}
