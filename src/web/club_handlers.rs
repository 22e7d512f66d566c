// src/web/club_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        account::Role,
        club::{Category, ClubCard, Decision, GroupPermission, JoinOutcome, MemberStatus, ModeratorTitle, RequestStatus},
        page::{paginate, PageQuery},
        realtime::ServerEvent,
    },
    services::club_service::{self, ClubFilter, NewClub},
    state::AppState,
    web::{
        mw_auth::{CurrentAccount, MaybeAccount},
        mw_club::ClubContext,
    },
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ClubListQuery {
    search: Option<String>,
    category: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinPayload {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionPayload {
    decision: Decision,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    status: MemberStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorPayload {
    user_id: String,
    #[serde(default)]
    role: ModeratorTitle,
}

pub(crate) fn parse_category(raw: Option<&str>) -> AppResult<Option<Category>> {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| {
            serde_json::from_value::<Category>(json!(c)).map_err(|_| AppError::validation("Invalid category"))
        })
        .transpose()
}

// GET /api/clubs (optional auth)
pub async fn list_clubs(
    State(state): State<AppState>,
    Query(params): Query<ClubListQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = ClubFilter {
        category: parse_category(params.category.as_deref())?,
        search: params.search,
        is_active: Some(true),
        include_private: false,
    };
    let (page, limit) = PageQuery { page: params.page, limit: params.limit }.resolve(50);
    let clubs = club_service::list_clubs(&state.store, &filter).await?;
    let (clubs, pagination) = paginate(clubs, page, limit);
    let clubs: Vec<ClubCard> = clubs.iter().map(ClubCard::from).collect();
    Ok(Json(json!({ "success": true, "clubs": clubs, "pagination": pagination })))
}

// POST /api/clubs
pub async fn create_club(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<NewClub>,
) -> AppResult<impl IntoResponse> {
    let club = club_service::create_club(&state.store, &account, payload, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Club created successfully", "club": club })),
    ))
}

// GET /api/clubs/{club_id} (optional auth)
pub async fn get_club(
    State(state): State<AppState>,
    Extension(MaybeAccount(viewer)): Extension<MaybeAccount>,
    Path(club_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut club = club_service::find_club(&state.store, &club_id).await?;
    let role = viewer.as_ref().map(|v| club.role_of(&v.id));
    let sees_requests = role.is_some_and(|r| r.meets(GroupPermission::Moderator))
        || viewer.as_ref().is_some_and(|v| v.role == Role::Admin);
    if !sees_requests {
        club.join_requests.clear();
    }
    Ok(Json(json!({
        "success": true,
        "club": club,
        "userRole": role.and_then(|r| r.label()),
    })))
}

// POST /api/clubs/{club_id}/join
pub async fn join_club(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(club_id): Path<String>,
    payload: Option<Json<JoinPayload>>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let (club, outcome) = club_service::join(&state.store, &account, &club_id, payload.message, Utc::now()).await?;
    let body = match outcome {
        JoinOutcome::Joined => json!({
            "success": true,
            "message": "Successfully joined the club",
            "status": "joined",
            "club": ClubCard::from(&club),
        }),
        JoinOutcome::Pending { request_id } => json!({
            "success": true,
            "message": "Join request submitted successfully. Waiting for approval.",
            "status": "pending",
            "requestId": request_id,
        }),
    };
    Ok(Json(body))
}

// POST /api/clubs/{club_id}/leave
pub async fn leave_club(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(club_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    club_service::leave(&state.store, &account, &club_id).await?;
    Ok(Json(json!({ "success": true, "message": "Successfully left the club" })))
}

// GET /api/clubs/{club_id}/members (member)
pub async fn list_members(Extension(ctx): Extension<ClubContext>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "members": ctx.club.members,
        "moderators": ctx.club.moderators,
        "admin": ctx.club.admin,
        "userRole": ctx.role.label(),
    }))
}

// GET /api/clubs/{club_id}/requests (moderator)
pub async fn list_requests(Extension(ctx): Extension<ClubContext>) -> impl IntoResponse {
    let pending: Vec<_> = ctx
        .club
        .join_requests
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .collect();
    Json(json!({ "success": true, "count": pending.len(), "requests": pending }))
}

// POST /api/clubs/{club_id}/requests/{request_id} (moderator)
pub async fn decide_request(
    State(state): State<AppState>,
    Extension(CurrentAccount(reviewer)): Extension<CurrentAccount>,
    Extension(ctx): Extension<ClubContext>,
    Path((_club_id, request_id)): Path<(String, String)>,
    Json(payload): Json<DecisionPayload>,
) -> AppResult<impl IntoResponse> {
    let (club, requester) = club_service::decide_request(
        &state.store,
        ctx.club,
        &reviewer,
        &request_id,
        payload.decision,
        payload.message.clone(),
        Utc::now(),
    )
    .await?;

    let status = match payload.decision {
        Decision::Approved => "approved",
        Decision::Rejected => "rejected",
    };
    state
        .hub
        .notify_user(
            &requester,
            &ServerEvent::ClubRequestDecided {
                club_id: club.id.clone(),
                club_name: club.name.clone(),
                request_id: request_id.clone(),
                status: status.to_string(),
                message: payload.message,
            },
        )
        .await;

    Ok(Json(json!({
        "success": true,
        "message": format!("Join request {status}"),
        "requestId": request_id,
        "status": status,
        "club": ClubCard::from(&club),
    })))
}

// PUT /api/clubs/{club_id}/members/{account_id}/status (moderator)
pub async fn set_member_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<ClubContext>,
    Path((_club_id, account_id)): Path<(String, String)>,
    Json(payload): Json<StatusPayload>,
) -> AppResult<impl IntoResponse> {
    let club = club_service::set_member_status(&state.store, ctx.club, &account_id, payload.status).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Member status updated",
        "club": ClubCard::from(&club),
    })))
}

// DELETE /api/clubs/{club_id}/members/{account_id} (moderator)
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<ClubContext>,
    Path((_club_id, account_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let club = club_service::remove_member(&state.store, ctx.club, &account_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Member removed",
        "club": ClubCard::from(&club),
    })))
}

// POST /api/clubs/{club_id}/moderators (admin)
pub async fn add_moderator(
    State(state): State<AppState>,
    Extension(ctx): Extension<ClubContext>,
    Json(payload): Json<ModeratorPayload>,
) -> AppResult<impl IntoResponse> {
    let (club, changed) =
        club_service::add_moderator(&state.store, ctx.club, &payload.user_id, payload.role, Utc::now()).await?;
    let message = if changed { "Moderator assigned" } else { "Moderator already holds this title" };
    Ok(Json(json!({ "success": true, "message": message, "moderators": club.moderators })))
}

// DELETE /api/clubs/{club_id}/moderators/{account_id} (admin)
pub async fn remove_moderator(
    State(state): State<AppState>,
    Extension(ctx): Extension<ClubContext>,
    Path((_club_id, account_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let club = club_service::remove_moderator(&state.store, ctx.club, &account_id).await?;
    Ok(Json(json!({ "success": true, "message": "Moderator removed", "moderators": club.moderators })))
}
