// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        account::{AccountSummary, Role},
        club::ClubCard,
        page::{paginate, PageQuery},
    },
    services::{
        admin_service,
        club_service::ClubFilter,
        user_service::{self, AccountFilter},
    },
    state::AppState,
    web::{club_handlers::parse_category, mw_auth::CurrentAccount, user_handlers::parse_role},
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
#[serde(rename_all = "camelCase")]
pub struct AdminUserQuery {
    role: Option<String>,
    department: Option<String>,
    search: Option<String>,
    is_active: Option<bool>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminClubQuery {
    is_active: Option<bool>,
    category: Option<String>,
    search: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    is_active: bool,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    role: Role,
}

// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let dashboard = admin_service::dashboard(&state.store, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "dashboard": dashboard })))
}

// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<AdminUserQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = AccountFilter {
        role: parse_role(params.role.as_deref())?,
        department: params.department.filter(|d| !d.trim().is_empty()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        include_inactive: true,
        ..Default::default()
    };
    let (page, limit) = PageQuery { page: params.page, limit: params.limit }.resolve(100);
    let mut accounts = user_service::search_accounts(&state.store, &filter).await?;
    if let Some(active) = params.is_active {
        accounts.retain(|a| a.is_active == active);
    }
    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let (accounts, pagination) = paginate(accounts, page, limit);
    let users: Vec<AccountSummary> = accounts.iter().map(AccountSummary::from).collect();
    Ok(Json(json!({ "success": true, "users": users, "pagination": pagination })))
}

// PUT /api/admin/users/{id}/status
pub async fn set_user_status(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> AppResult<impl IntoResponse> {
    if change.reason.as_ref().is_some_and(|r| r.trim().chars().count() > 500) {
        return Err(AppError::validation("Reason cannot exceed 500 characters"));
    }
    let account =
        user_service::set_active(&state.store, &admin, &id, change.is_active, change.reason.clone(), Utc::now())
            .await?;
    let verb = if account.is_active { "activated" } else { "deactivated" };
    Ok(Json(json!({
        "success": true,
        "message": format!("User {verb} successfully"),
        "user": {
            "id": account.id,
            "name": account.full_name(),
            "email": account.email,
            "isActive": account.is_active,
            "reason": change.reason,
        },
    })))
}

// PUT /api/admin/users/{id}/role
pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Path(id): Path<String>,
    Json(change): Json<RoleChange>,
) -> AppResult<impl IntoResponse> {
    let account = user_service::set_role(&state.store, &admin, &id, change.role).await?;
    Ok(Json(json!({
        "success": true,
        "message": "User role updated successfully",
        "user": AccountSummary::from(&account),
    })))
}

// GET /api/admin/clubs
pub async fn list_clubs(
    State(state): State<AppState>,
    Query(params): Query<AdminClubQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = ClubFilter {
        category: parse_category(params.category.as_deref())?,
        search: params.search,
        is_active: params.is_active,
        include_private: true,
    };
    let (page, limit) = PageQuery { page: params.page, limit: params.limit }.resolve(100);
    let clubs = admin_service::list_clubs(&state.store, filter).await?;
    let (clubs, pagination) = paginate(clubs, page, limit);
    let clubs: Vec<ClubCard> = clubs.iter().map(ClubCard::from).collect();
    Ok(Json(json!({ "success": true, "clubs": clubs, "pagination": pagination })))
}
