// src/web/resume_handlers.rs
use crate::{
    error::AppResult,
    models::resume::ResumeUpdate,
    services::resume_service,
    state::AppState,
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{Extension, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

// GET /api/resume
pub async fn get_resume(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> AppResult<impl IntoResponse> {
    let resume = resume_service::get(&state.store, &account.id).await?;
    Ok(Json(json!({ "success": true, "resume": resume })))
}

// PUT /api/resume
pub async fn update_resume(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(update): Json<ResumeUpdate>,
) -> AppResult<impl IntoResponse> {
    let resume = resume_service::update(&state.store, &account.id, update, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "message": "Resume updated successfully", "resume": resume })))
}
