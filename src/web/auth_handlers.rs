// src/web/auth_handlers.rs
use crate::{
    error::AppResult,
    models::account::{
        Account, AccountResponse, DeactivatePayload, LoginPayload, PasswordChange, ProfileUpdate, RegisterPayload,
    },
    services::{admin_service, auth_service, user_service},
    state::AppState,
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

fn token_for(state: &AppState, account: &Account) -> AppResult<String> {
    auth_service::issue_token(&account.id, &state.config.jwt_secret, state.config.token_ttl)
}

// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let account = user_service::register(&state.store, payload, Utc::now()).await?;
    let token = token_for(&state, &account)?;
    tracing::info!("Registered {} ({})", account.id, account.role);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "token": token,
            "user": AccountResponse::from(&account),
        })),
    ))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    let account = user_service::login(&state.store, &payload.email, &payload.password, Utc::now()).await?;
    let token = token_for(&state, &account)?;
    tracing::info!("Login: {}", account.id);
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": AccountResponse::from(&account),
    })))
}

// GET /api/auth/me
pub async fn me(Extension(CurrentAccount(account)): Extension<CurrentAccount>) -> impl IntoResponse {
    Json(json!({ "success": true, "user": AccountResponse::from(&account) }))
}

// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<impl IntoResponse> {
    let account = user_service::update_profile(&state.store, account, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": AccountResponse::from(&account),
    })))
}

// PUT /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(change): Json<PasswordChange>,
) -> AppResult<impl IntoResponse> {
    user_service::change_password(&state.store, account, change).await?;
    Ok(Json(json!({ "success": true, "message": "Password updated successfully" })))
}

// GET /api/auth/stats (admin)
pub async fn stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = admin_service::account_stats(&state.store, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> AppResult<impl IntoResponse> {
    user_service::logout(&state.store, account, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "message": "Logged out successfully" })))
}

// DELETE /api/auth/account
pub async fn deactivate_account(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<DeactivatePayload>,
) -> AppResult<impl IntoResponse> {
    user_service::deactivate(&state.store, account, payload, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "message": "Account deactivated successfully" })))
}
