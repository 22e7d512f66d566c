// src/error.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::models::club::MembershipError;

// Set once at startup from the config; controls whether failure details reach the client.
static DEVELOPMENT_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_development_mode(enabled: bool) {
    DEVELOPMENT_MODE.store(enabled, Ordering::Relaxed);
}

fn development_mode() -> bool {
    DEVELOPMENT_MODE.load(Ordering::Relaxed)
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid token")]
    InvalidCredential(String),

    #[error("Token has expired")]
    ExpiredCredential,

    #[error("Account has been deactivated")]
    AccountDeactivated,

    #[error("{message}")]
    Unauthorized { message: String, code: &'static str },

    #[error("{message}")]
    BadRequest { message: String, code: &'static str },

    #[error("{message}")]
    NotFound { message: String, code: &'static str },

    #[error("{message}")]
    Forbidden { message: String, code: &'static str },

    #[error("{message}")]
    Conflict { message: String, code: &'static str },

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: u64 },

    #[error("Service temporarily unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Document encoding error: {0}")]
    DocumentError(#[from] serde_json::Error),

    #[error("Failed to process password")]
    PasswordHashingError,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, code: &'static str) -> Self {
        AppError::BadRequest { message: message.into(), code }
    }

    pub fn unauthorized(message: impl Into<String>, code: &'static str) -> Self {
        AppError::Unauthorized { message: message.into(), code }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::BadRequest { message: message.into(), code: "VALIDATION_ERROR" }
    }

    pub fn not_found(message: impl Into<String>, code: &'static str) -> Self {
        AppError::NotFound { message: message.into(), code }
    }

    pub fn forbidden(message: impl Into<String>, code: &'static str) -> Self {
        AppError::Forbidden { message: message.into(), code }
    }

    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        AppError::Conflict { message: message.into(), code }
    }

    /// HTTP status, machine code and the message that is safe to show the caller.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::InvalidCredential(_) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", self.to_string())
            }
            AppError::ExpiredCredential => {
                (StatusCode::UNAUTHORIZED, "EXPIRED_TOKEN", self.to_string())
            }
            AppError::AccountDeactivated => {
                (StatusCode::UNAUTHORIZED, "ACCOUNT_DEACTIVATED", self.to_string())
            }
            AppError::Unauthorized { message, code } => (StatusCode::UNAUTHORIZED, *code, message.clone()),
            AppError::BadRequest { message, code } => (StatusCode::BAD_REQUEST, *code, message.clone()),
            AppError::NotFound { message, code } => (StatusCode::NOT_FOUND, *code, message.clone()),
            AppError::Forbidden { message, code } => (StatusCode::FORBIDDEN, *code, message.clone()),
            AppError::Conflict { message, code } => (StatusCode::CONFLICT, *code, message.clone()),
            AppError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED", self.to_string())
            }
            AppError::UpstreamUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Database service temporarily unavailable".to_string(),
            ),
            AppError::SqlxError(e) if is_upstream_failure(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_ERROR",
                "Database service temporarily unavailable".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

fn is_upstream_failure(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed
    )
}

impl From<MembershipError> for AppError {
    fn from(e: MembershipError) -> Self {
        let message = e.to_string();
        match e {
            MembershipError::ClubUnavailable => AppError::bad_request(message, "CLUB_NOT_AVAILABLE"),
            MembershipError::AlreadyMember => AppError::bad_request(message, "ALREADY_MEMBER"),
            MembershipError::Suspended => AppError::forbidden(message, "MEMBERSHIP_SUSPENDED"),
            MembershipError::RequestPending => AppError::conflict(message, "REQUEST_ALREADY_PENDING"),
            MembershipError::ClubFull => AppError::conflict(message, "CLUB_FULL"),
            MembershipError::RequestNotFound => AppError::not_found(message, "REQUEST_NOT_FOUND"),
            MembershipError::AlreadyDecided => AppError::conflict(message, "REQUEST_ALREADY_DECIDED"),
            MembershipError::NotAMember => AppError::bad_request(message, "NOT_A_MEMBER"),
            MembershipError::NotAModerator => AppError::not_found(message, "MODERATOR_NOT_FOUND"),
            MembershipError::AdminImmovable => AppError::bad_request(message, "CLUB_ADMIN_IMMOVABLE"),
        }
    }
}

// How an AppError becomes the JSON failure body
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {:?}", status, self);
        } else {
            tracing::debug!("Request rejected ({} {}): {}", status, code, self);
        }

        let mut body = json!({
            "success": false,
            "message": message,
            "code": code,
            "type": status.canonical_reason().unwrap_or("Error"),
        });

        if let AppError::RateLimited { retry_after } = &self {
            body["retryAfter"] = json!(retry_after);
        }
        if development_mode() {
            body["details"] = json!(format!("{:?}", self));
        }

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T = ()> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::InvalidCredential("x".into()).parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ExpiredCredential.parts().1, "EXPIRED_TOKEN");
        assert_eq!(AppError::AccountDeactivated.parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::RateLimited { retry_after: 3 }.parts().0, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::UpstreamUnavailable("timeout".into()).parts().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::SqlxError(sqlx::Error::PoolTimedOut).parts().0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unexpected_errors_hide_their_detail() {
        let (status, code, message) = AppError::Unexpected("secret stack".into()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("secret"));
    }

    #[test]
    fn membership_errors_are_structured() {
        let e: AppError = MembershipError::AlreadyDecided.into();
        assert_eq!(e.parts().0, StatusCode::CONFLICT);
        assert_eq!(e.parts().1, "REQUEST_ALREADY_DECIDED");
    }
}
