use serde::Deserialize;
use serde::Serialize;

use crate::role::Role;

/// Verified contents of a session token.
///
/// Ephemeral, never persisted. Produced by the login state machine on
/// success and consumed by the role gate on every protected call. There is
/// no server-side revocation list: lifetime is strictly the signed `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject: the account identifier.
    pub sub: String,

    /// Role the subject held at issuance.
    pub role: Role,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}
