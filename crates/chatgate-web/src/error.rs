use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    /// Wrong email or password. `attempts_left` counts down to a lockout.
    InvalidCredentials { attempts_left: u32 },
    Validation(String),
    NotFound,
    Conflict(String),
    /// Request quota for this client is spent.
    RateLimited { retry_after_secs: u64 },
    /// Too many failed logins for this client and account.
    Locked { retry_after_secs: u64 },
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(rename = "attemptsLeft", skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<u32>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidCredentials { .. } => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            AppError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            AppError::Locked { .. } => (StatusCode::TOO_MANY_REQUESTS, "LOGIN_LOCKED"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let mut attempts_left = None;
        let (message, retry_after) = match self {
            AppError::InvalidCredentials {
                attempts_left: left,
            } => {
                attempts_left = Some(left);
                ("Invalid email or password".to_string(), None)
            }
            AppError::Validation(msg) | AppError::Conflict(msg) => (msg, None),
            AppError::NotFound => ("Not found".to_string(), None),
            AppError::RateLimited { retry_after_secs } => {
                ("Too many requests".to_string(), Some(retry_after_secs))
            }
            AppError::Locked { retry_after_secs } => (
                "Too many failed login attempts. Please try again later.".to_string(),
                Some(retry_after_secs),
            ),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
        };

        let body = ErrorBody {
            error: message,
            code,
            attempts_left,
        };
        let mut response = (status, axum::Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        AppError::Internal("Internal server error".to_string())
    }
}
