// src/web/mess_handlers.rs
use crate::{
    error::AppResult,
    models::mess::{weekly_menu, Complaint},
    services::mess_service::{self, NewComplaint, Resolution},
    state::AppState,
    web::{mw_auth::CurrentAccount, mw_ownership::OwnedResource},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

// GET /api/mess/menu
pub async fn menu() -> impl IntoResponse {
    Json(json!({ "success": true, "menu": weekly_menu() }))
}

// POST /api/mess/complaint
pub async fn submit_complaint(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(new): Json<NewComplaint>,
) -> AppResult<impl IntoResponse> {
    let complaint = mess_service::submit(&state.store, &account, new, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Complaint submitted successfully", "complaint": complaint })),
    ))
}

// GET /api/mess/complaints
pub async fn list_complaints(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> AppResult<impl IntoResponse> {
    let complaints = mess_service::list(&state.store, &account).await?;
    Ok(Json(json!({ "success": true, "count": complaints.len(), "complaints": complaints })))
}

// GET /api/mess/complaints/{id} (owner)
pub async fn get_complaint(Extension(OwnedResource(complaint)): Extension<OwnedResource<Complaint>>) -> impl IntoResponse {
    Json(json!({ "success": true, "complaint": complaint }))
}

// PUT /api/mess/complaints/{id}/resolve (staff)
pub async fn resolve_complaint(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(id): Path<String>,
    Json(resolution): Json<Resolution>,
) -> AppResult<impl IntoResponse> {
    let complaint = mess_service::resolve(&state.store, &account, &id, resolution, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "message": "Complaint resolved", "complaint": complaint })))
}
