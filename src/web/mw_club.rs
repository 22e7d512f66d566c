// src/web/mw_club.rs
//
// Group-permission gate. Loads the club named by the `club_id` path segment, or by
// `clubId` in a JSON body, and hands it to the handler with the caller's standing.
use crate::{
    error::{AppError, AppResult},
    models::club::{Club, GroupPermission, GroupRole},
    services::{club_service, policy},
    state::AppState,
    web::mw_auth::CurrentAccount,
};
use axum::{
    body::{to_bytes, Body},
    extract::{Extension, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

const BODY_LIMIT: usize = 1024 * 1024;

/// The club a gated route operates on.
#[derive(Clone, Debug)]
pub struct ClubContext {
    pub club: Club,
    pub role: GroupRole,
}

/// Buffers the body so the handler can still read it after we peek at `clubId`.
async fn club_id_from_body(request: Request) -> AppResult<(Option<String>, Request)> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|e| AppError::bad_request(format!("Unreadable request body: {e}"), "INVALID_BODY"))?;
    let club_id = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("clubId").and_then(|id| id.as_str()).map(str::to_string));
    Ok((club_id, Request::from_parts(parts, Body::from(bytes))))
}

async fn gate(
    state: AppState,
    account: CurrentAccount,
    params: RawPathParams,
    required: GroupPermission,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let from_path = params
        .iter()
        .find(|(key, _)| *key == "club_id")
        .map(|(_, value)| value.to_string());
    let (club_id, mut request) = match from_path {
        Some(id) => (Some(id), request),
        None => club_id_from_body(request).await?,
    };
    let club_id = club_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Club ID is required", "CLUB_ID_REQUIRED"))?;

    let club = club_service::find_club(&state.store, &club_id).await?;
    let CurrentAccount(account) = account;
    let role = match policy::check_group_permission(&account, &club, required) {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(
                "Club MW: {} lacks {} permission on club {}",
                account.id,
                required.as_str(),
                club.id
            );
            return Err(e);
        }
    };
    tracing::debug!("Club MW: {} is {:?} in club {}", account.id, role, club.id);

    request.extensions_mut().insert(ClubContext { club, role });
    Ok(next.run(request).await)
}

pub async fn require_club_member(
    State(state): State<AppState>,
    Extension(account): Extension<CurrentAccount>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    gate(state, account, params, GroupPermission::Member, request, next).await
}

pub async fn require_club_moderator(
    State(state): State<AppState>,
    Extension(account): Extension<CurrentAccount>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    gate(state, account, params, GroupPermission::Moderator, request, next).await
}

pub async fn require_club_admin(
    State(state): State<AppState>,
    Extension(account): Extension<CurrentAccount>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    gate(state, account, params, GroupPermission::Admin, request, next).await
}
