// src/web/schedule_handlers.rs
use crate::{
    error::AppResult,
    services::schedule_service::{self, NewClass, NewEvent, NewExam},
    state::AppState,
    web::mw_auth::CurrentAccount,
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
pub struct UpcomingQuery {
    limit: Option<usize>,
}

// GET /api/schedule
pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> AppResult<impl IntoResponse> {
    let schedule = schedule_service::get_or_create(&state.store, &account.id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "schedule": schedule })))
}

// POST /api/schedule/class
pub async fn add_class(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(new): Json<NewClass>,
) -> AppResult<impl IntoResponse> {
    let class = schedule_service::add_class(&state.store, &account.id, new, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Class added successfully", "class": class })),
    ))
}

// POST /api/schedule/event
pub async fn add_event(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(new): Json<NewEvent>,
) -> AppResult<impl IntoResponse> {
    let event = schedule_service::add_event(&state.store, &account.id, new, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Event added successfully", "event": event })),
    ))
}

// POST /api/schedule/exam
pub async fn add_exam(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(new): Json<NewExam>,
) -> AppResult<impl IntoResponse> {
    let exam = schedule_service::add_exam(&state.store, &account.id, new, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Exam added successfully", "exam": exam })),
    ))
}

// PUT /api/schedule/event/{event_id}/complete
pub async fn complete_event(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(event_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    schedule_service::complete_event(&state.store, &account.id, &event_id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "message": "Event marked as completed" })))
}

// GET /api/schedule/upcoming
pub async fn upcoming(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Query(params): Query<UpcomingQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let upcoming = schedule_service::upcoming(&state.store, &account.id, limit, Utc::now()).await?;
    Ok(Json(json!({
        "success": true,
        "upcomingEvents": upcoming.upcoming_events,
        "upcomingExams": upcoming.upcoming_exams,
        "todayClasses": upcoming.today_classes,
    })))
}
