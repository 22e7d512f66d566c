// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::account::Account,
    services::auth_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

/// The verified caller, inserted by `require_auth`.
#[derive(Clone, Debug)]
pub struct CurrentAccount(pub Account);

/// Inserted by `optional_auth`; `None` for anonymous callers.
#[derive(Clone, Debug)]
pub struct MaybeAccount(pub Option<Account>);

pub fn bearer_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Rejects the request unless it carries a valid credential for an active account.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let raw = bearer_from_headers(request.headers()).unwrap_or_default().to_string();

    match auth_service::verify_credential(&state.store, &state.config.jwt_secret, &raw).await {
        Ok(account) => {
            tracing::debug!("Auth MW: {} authenticated as {}", account.id, account.role);
            request.extensions_mut().insert(CurrentAccount(account));
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!("Auth MW: rejected {} {}: {}", request.method(), request.uri().path(), e);
            Err(e)
        }
    }
}

/// Like `require_auth`, but any failure proceeds anonymously.
pub async fn optional_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let account = match bearer_from_headers(request.headers()).map(str::to_string) {
        Some(raw) => auth_service::verify_credential(&state.store, &state.config.jwt_secret, &raw)
            .await
            .inspect_err(|e| tracing::debug!("Optional auth MW: continuing anonymously ({})", e))
            .ok(),
        None => None,
    };
    if let Some(account) = &account {
        // Downstream throttles key on the verified caller
        request.extensions_mut().insert(CurrentAccount(account.clone()));
    }
    request.extensions_mut().insert(MaybeAccount(account));
    next.run(request).await
}
