use std::sync::Arc;

use auth::Role;
use auth::SessionClaims;
use auth::TokenCodec;
use axum::extract::Request;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use crate::account::models::AccountId;

/// Extension type carrying the verified caller through request extensions.
///
/// Its presence proves token verification passed; the role gate and the
/// handlers read it and never re-verify.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
    pub claims: SessionClaims,
}

/// Static allow-list of roles for one protected operation.
///
/// Built once at router construction; the check itself is a pure set
/// membership test with no side effects.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Arc<[Role]>,
}

impl RoleGate {
    pub fn new(allowed: Vec<Role>) -> Self {
        Self {
            allowed: allowed.into(),
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Middleware that verifies the bearer token and stores the caller in
/// request extensions. Runs before any role gate and any handler.
pub async fn authenticate(
    codec: Arc<TokenCodec>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims = codec.verify(token).map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string()).into_response()
    })?;

    let account_id = AccountId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!("Token subject is not an account id: {}", e);
        ApiError::Unauthorized("Invalid token format".to_string()).into_response()
    })?;

    req.extensions_mut()
        .insert(AuthenticatedAccount { account_id, claims });

    Ok(next.run(req).await)
}

/// Middleware that rejects callers whose role is outside the gate.
///
/// Must be layered inside `authenticate`: absent claims mean verification
/// never ran, which is a 401, not a 403.
pub async fn authorize(gate: RoleGate, req: Request, next: Next) -> Result<Response, Response> {
    let Some(caller) = req.extensions().get::<AuthenticatedAccount>() else {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()).into_response());
    };

    if !gate.allows(caller.claims.role) {
        return Err(
            ApiError::Forbidden("Forbidden: insufficient permissions".to_string()).into_response(),
        );
    }

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::Unauthorized("Missing Authorization header".to_string()).into_response()
        })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        ApiError::Unauthorized("Invalid Authorization header".to_string()).into_response()
    })?;

    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
        .into_response());
    };

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gate_membership() {
        let gate = RoleGate::new(vec![Role::Admin, Role::Tutor]);

        assert!(gate.allows(Role::Admin));
        assert!(gate.allows(Role::Tutor));
        assert!(!gate.allows(Role::Student));
    }

    #[test]
    fn test_role_gate_admin_only() {
        let gate = RoleGate::new(vec![Role::Admin]);

        assert!(gate.allows(Role::Admin));
        assert!(!gate.allows(Role::Tutor));
        assert!(!gate.allows(Role::Student));
    }
}
