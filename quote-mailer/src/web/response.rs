//! JSON response envelope shared by every endpoint outcome.

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::SubmissionError;

pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

pub const SUCCESS_MESSAGE: &str = "Email envoyé avec succès";

/// `{status, message}` body.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl ApiResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            message: SUCCESS_MESSAGE,
        }
    }

    pub fn error(message: &'static str) -> Self {
        Self {
            status: "error",
            message,
        }
    }
}

/// 200 envelope with the remaining quota for the client.
pub fn success_response(mut headers: HeaderMap, remaining: u32) -> Response {
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    (StatusCode::OK, headers, Json(ApiResponse::success())).into_response()
}

/// Error envelope; the message never carries internal detail.
pub fn error_response(error: &SubmissionError, mut headers: HeaderMap) -> Response {
    if let SubmissionError::RateLimited { retry_after_secs } = error {
        headers.insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
    }
    (
        error.status(),
        headers,
        Json(ApiResponse::error(error.user_message())),
    )
        .into_response()
}

/// Empty 200 carrying only the CORS headers.
pub fn preflight_response(headers: HeaderMap) -> Response {
    (StatusCode::OK, headers).into_response()
}
