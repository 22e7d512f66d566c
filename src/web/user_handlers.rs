// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        account::{Account, AccountResponse, AccountSummary, Role},
        page::{paginate, PageQuery},
    },
    services::user_service::{self, AccountFilter, AccountUpdate},
    state::AppState,
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    search: Option<String>,
    role: Option<String>,
    department: Option<String>,
    year: Option<u8>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentQuery {
    year: Option<u8>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    department: Option<String>,
    year: Option<u8>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PointsPayload {
    points: i64,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AchievementPayload {
    title: String,
    description: String,
    icon: Option<String>,
}

pub(crate) fn parse_role(raw: Option<&str>) -> AppResult<Option<Role>> {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| r.parse::<Role>().map_err(|_| AppError::validation("Invalid role")))
        .transpose()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Self, or staff looking at someone else.
fn ensure_self_or_staff(caller: &Account, target_id: &str) -> AppResult<()> {
    if caller.id == target_id || caller.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::forbidden("Access denied", "ACCESS_DENIED"))
    }
}

// GET /api/users (staff)
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<DirectoryQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = AccountFilter {
        role: parse_role(params.role.as_deref())?,
        department: non_blank(params.department),
        year: params.year,
        search: params.search.filter(|s| !s.trim().is_empty()),
        include_inactive: false,
    };
    let (page, limit) = PageQuery { page: params.page, limit: params.limit }.resolve(50);
    let accounts = user_service::search_accounts(&state.store, &filter).await?;
    let (accounts, pagination) = paginate(accounts, page, limit);
    let users: Vec<AccountSummary> = accounts.iter().map(AccountSummary::from).collect();
    Ok(Json(json!({ "success": true, "users": users, "pagination": pagination })))
}

// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Extension(CurrentAccount(caller)): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    ensure_self_or_staff(&caller, &id)?;
    let account = user_service::find_account(&state.store, &id).await?;
    Ok(Json(json!({ "success": true, "user": AccountResponse::from(&account) })))
}

// PUT /api/users/{id} (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Path(id): Path<String>,
    Json(update): Json<AccountUpdate>,
) -> AppResult<impl IntoResponse> {
    let account = user_service::admin_update(&state.store, &admin, &id, update, Utc::now()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": {
            "id": account.id,
            "email": account.email,
            "fullName": account.full_name(),
            "role": account.role,
            "isActive": account.is_active,
            "isVerified": account.is_verified,
        },
    })))
}

// GET /api/users/department/{department}
pub async fn department_users(
    State(state): State<AppState>,
    Path(department): Path<String>,
    Query(params): Query<DepartmentQuery>,
) -> AppResult<impl IntoResponse> {
    let role = parse_role(params.role.as_deref())?.unwrap_or(Role::Student);
    let members = user_service::department_members(&state.store, &department, params.year, role).await?;
    let users: Vec<AccountSummary> = members.iter().map(AccountSummary::from).collect();
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
        "department": department,
        "year": params.year,
        "role": role,
    })))
}

// GET /api/users/classmates/{id}
pub async fn classmates(
    State(state): State<AppState>,
    Extension(CurrentAccount(caller)): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    ensure_self_or_staff(&caller, &id)?;
    let result = user_service::classmates(&state.store, &id).await?;
    Ok(Json(json!({
        "success": true,
        "count": result.classmates.len(),
        "classmates": result.classmates,
        "department": result.department,
        "year": result.year,
    })))
}

// GET /api/users/leaderboard/points
pub async fn leaderboard(
    State(state): State<AppState>,
    Extension(CurrentAccount(caller)): Extension<CurrentAccount>,
    Query(params): Query<LeaderboardQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(50);
    if !(1..=100).contains(&limit) {
        return Err(AppError::validation("Limit must be between 1 and 100"));
    }
    let department = non_blank(params.department);
    let board =
        user_service::leaderboard(&state.store, &caller, department.as_deref(), params.year, limit).await?;
    Ok(Json(json!({
        "success": true,
        "leaderboard": board.leaderboard,
        "currentUserRank": board.current_user_rank,
        "filters": { "department": department, "year": params.year },
        "total": board.total,
    })))
}

// PUT /api/users/{id}/points (admin)
pub async fn set_points(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PointsPayload>,
) -> AppResult<impl IntoResponse> {
    if payload.reason.as_ref().is_some_and(|r| r.trim().chars().count() > 200) {
        return Err(AppError::validation("Reason cannot exceed 200 characters"));
    }
    let (old_points, new_points) = user_service::set_points(&state.store, &id, payload.points).await?;
    Ok(Json(json!({
        "success": true,
        "message": "User points updated successfully",
        "user": {
            "id": id,
            "oldPoints": old_points,
            "newPoints": new_points,
            "change": new_points - old_points,
            "reason": payload.reason,
        },
    })))
}

// POST /api/users/{id}/achievement (admin)
pub async fn add_achievement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AchievementPayload>,
) -> AppResult<impl IntoResponse> {
    let achievement = user_service::grant_achievement(
        &state.store,
        &id,
        &payload.title,
        &payload.description,
        payload.icon.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Achievement added successfully",
        "achievement": achievement,
    })))
}
