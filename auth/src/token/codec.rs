use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::SessionClaims;
use super::errors::TokenError;
use crate::role::Role;

/// Session token codec: signs and verifies [`SessionClaims`].
///
/// Uses HS256 with a process-wide secret injected at construction.
/// Rotating the secret invalidates every outstanding token; no other
/// revocation mechanism exists.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with a signing secret and token lifetime.
    ///
    /// # Arguments
    /// * `secret` - HMAC secret; at least 256 bits recommended for HS256
    /// * `ttl_hours` - Hours until an issued token expires
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a signed token for a subject and role.
    ///
    /// Stamps `iat` with the current time and `exp` with the configured
    /// lifetime from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature does not match the secret
    /// * `Expired` - Current time is past the embedded expiry
    /// * `Malformed` - Token does not parse or carries unusable claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let validation = Validation::new(self.algorithm);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}
