// src/web/mw_ownership.rs
use crate::{
    db::Document,
    error::AppError,
    services::policy::{self, Owned},
    state::AppState,
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{Extension, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

/// The resource loaded by `require_owner`, handed to the handler.
#[derive(Clone, Debug)]
pub struct OwnedResource<D>(pub D);

/// Loads the document named by the `id` path segment and requires the caller to own it
/// (or be an admin). Must run after `require_auth`.
pub async fn require_owner<D>(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    D: Document + Owned + Clone + 'static,
{
    let id = params
        .iter()
        .find(|(key, _)| *key == "id")
        .map(|(_, value)| value.to_string())
        .unwrap_or_default();

    let resource: Option<D> = state.store.find_by_id(&id).await?;
    if let Err(e) = policy::check_ownership(&account, resource.as_ref()) {
        tracing::warn!("Ownership MW: {} denied on {}", account.id, id);
        return Err(e);
    }
    if let Some(resource) = resource {
        request.extensions_mut().insert(OwnedResource(resource));
    }
    Ok(next.run(request).await)
}
