// src/web/health_handlers.rs
use crate::{error::AppResult, state::AppState};
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

// GET /api/health
pub async fn health(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    sqlx::query("SELECT 1").execute(state.store.pool()).await?;
    Ok(Json(json!({
        "success": true,
        "status": "OK",
        "timestamp": Utc::now(),
        "connections": state.hub.connection_count().await,
    })))
}
