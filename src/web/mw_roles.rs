// src/web/mw_roles.rs
use crate::{
    error::AppError,
    models::account::Role,
    services::policy::{self, STAFF_ROLES},
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

async fn require_roles(
    account: &CurrentAccount,
    allowed: &[Role],
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let CurrentAccount(account) = account;
    if let Err(e) = policy::check_role(account, allowed) {
        tracing::warn!(
            "Role MW: {} ({}) denied on {}",
            account.id,
            account.role,
            request.uri().path()
        );
        return Err(e);
    }
    Ok(next.run(request).await)
}

/// Admin only. Must run after `require_auth`.
pub async fn require_admin(
    Extension(account): Extension<CurrentAccount>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&account, &[Role::Admin], request, next).await
}

/// Faculty or admin. Must run after `require_auth`.
pub async fn require_staff(
    Extension(account): Extension<CurrentAccount>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&account, STAFF_ROLES, request, next).await
}
