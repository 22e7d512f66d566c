// src/web/interview_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::interview::{Difficulty, InterviewCategory},
    services::interview_service::{self, AnswerSubmission, NewSession},
    state::AppState,
    web::mw_auth::CurrentAccount,
};
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    category: Option<String>,
    difficulty: Option<String>,
    limit: Option<usize>,
}

fn parse_choice<T: DeserializeOwned>(raw: Option<&str>, what: &str) -> AppResult<Option<T>> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| serde_json::from_value::<T>(json!(v)).map_err(|_| AppError::validation(format!("Invalid {what}"))))
        .transpose()
}

// GET /api/interview/questions
pub async fn list_questions(Query(params): Query<QuestionQuery>) -> AppResult<impl IntoResponse> {
    let category: Option<InterviewCategory> = parse_choice(params.category.as_deref(), "category")?;
    let difficulty: Option<Difficulty> = parse_choice(params.difficulty.as_deref(), "difficulty")?;
    let questions = interview_service::list_questions(category, difficulty, params.limit.unwrap_or(10))?;
    Ok(Json(json!({ "success": true, "total": questions.len(), "questions": questions })))
}

// POST /api/interview/session
pub async fn start_session(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<NewSession>,
) -> AppResult<impl IntoResponse> {
    let session = interview_service::start_session(&state.interviews, &account.id, payload, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Interview session started",
            "session": {
                "id": session.id,
                "type": session.kind,
                "category": session.category,
                "questionCount": session.question_count,
                "startTime": session.start_time,
                "firstQuestion": session.questions.first(),
            },
        })),
    ))
}

// POST /api/interview/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<AnswerSubmission>,
) -> AppResult<impl IntoResponse> {
    let result = interview_service::submit_answer(&state.interviews, &account.id, payload, Utc::now())?;
    Ok(Json(json!({
        "success": true,
        "message": "Answer submitted successfully",
        "result": result,
    })))
}
