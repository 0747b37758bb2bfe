use std::sync::Arc;
use std::time::Duration;

use auth::Role;
use auth::TokenCodec;
use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use axum::middleware;
use axum::middleware::Next;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::dashboard::dashboard;
use super::handlers::import_csv::import_csv;
use super::handlers::login::login;
use super::handlers::reset_password::reset_password;
use super::middleware::authenticate;
use super::middleware::authorize;
use super::middleware::RoleGate;
use crate::account::ports::AccountRepository;
use crate::account::ports::EnrollmentStore;
use crate::account::service::AccountService;

pub struct AppState<AR, ES>
where
    AR: AccountRepository,
    ES: EnrollmentStore,
{
    pub account_service: Arc<AccountService<AR, ES>>,
    pub token_codec: Arc<TokenCodec>,
}

impl<AR, ES> Clone for AppState<AR, ES>
where
    AR: AccountRepository,
    ES: EnrollmentStore,
{
    fn clone(&self) -> Self {
        Self {
            account_service: Arc::clone(&self.account_service),
            token_codec: Arc::clone(&self.token_codec),
        }
    }
}

/// Build the HTTP router.
///
/// Protected routes are wrapped so that token verification always runs
/// before the role gate, and the gate before the handler; a handler is
/// unreachable unless both affirmatively passed. `allow_tutor_import`
/// selects the deployment's import-csv policy (ADMIN only, or
/// ADMIN + TUTOR).
pub fn create_router<AR, ES>(
    account_service: Arc<AccountService<AR, ES>>,
    token_codec: Arc<TokenCodec>,
    allow_tutor_import: bool,
) -> Router
where
    AR: AccountRepository,
    ES: EnrollmentStore,
{
    let state = AppState {
        account_service,
        token_codec: Arc::clone(&token_codec),
    };

    let import_gate = RoleGate::new(if allow_tutor_import {
        vec![Role::Admin, Role::Tutor]
    } else {
        vec![Role::Admin]
    });
    let any_role_gate = RoleGate::new(Role::ALL.to_vec());

    let public_routes = Router::new()
        .route("/api/auth/login", post(login::<AR, ES>))
        .route("/api/auth/reset-password", post(reset_password::<AR, ES>));

    let protected_routes = Router::new()
        .route(
            "/api/auth/import-csv",
            post(import_csv::<AR, ES>).layer(middleware::from_fn(
                move |req: Request, next: Next| {
                    let gate = import_gate.clone();
                    async move { authorize(gate, req, next).await }
                },
            )),
        )
        .route(
            "/api/auth/dashboard",
            get(dashboard::<AR, ES>).layer(middleware::from_fn(
                move |req: Request, next: Next| {
                    let gate = any_role_gate.clone();
                    async move { authorize(gate, req, next).await }
                },
            )),
        )
        // route_layer wraps the per-route gates, so verification runs first.
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            let codec = Arc::clone(&token_codec);
            async move { authenticate(codec, req, next).await }
        }));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
