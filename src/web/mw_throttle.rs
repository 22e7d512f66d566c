// src/web/mw_throttle.rs
use crate::{
    error::AppError,
    state::AppState,
    throttle::{Throttle, ThrottleDecision},
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

async fn enforce_key(throttle: &Throttle, key: &str, request: Request, next: Next) -> Result<Response, AppError> {
    match throttle.check(key) {
        ThrottleDecision::Allowed => Ok(next.run(request).await),
        ThrottleDecision::Denied { retry_after_secs } => {
            tracing::warn!("Throttle MW: {} limited, retry in {}s", key, retry_after_secs);
            Err(AppError::RateLimited { retry_after: retry_after_secs })
        }
    }
}

async fn enforce(throttle: &Throttle, request: Request, next: Next) -> Result<Response, AppError> {
    // Anonymous callers are not throttled
    let Some(account_id) = request
        .extensions()
        .get::<CurrentAccount>()
        .map(|CurrentAccount(account)| account.id.clone())
    else {
        return Ok(next.run(request).await);
    };
    enforce_key(throttle, &account_id, request, next).await
}

/// Default per-account limit for authenticated API groups.
pub async fn throttle_api(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    enforce(&state.api_throttle, request, next).await
}

/// Tighter limit for the users API.
pub async fn throttle_users(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    enforce(&state.users_throttle, request, next).await
}

/// Register and login, keyed by the client address since there is no account yet.
pub async fn throttle_auth(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    enforce_key(&state.auth_throttle, &client, request, next).await
}
