//! Submission endpoint handlers.
//!
//! The submission handler runs the whole pipeline inline:
//! 1. CORS preflight and method check
//! 2. Rate limit per client address
//! 3. Body size guard and JSON decoding
//! 4. Sanitize, validate, compose
//! 5. Hand the email to the provider
//!
//! Every failure ends the request with a JSON error envelope.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, header::ORIGIN, HeaderMap, Method},
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::delivery::{Mailer, OutboundEmail};
use crate::guard::{client_key, CorsPolicy, RateLimitStore, RateLimiter};
use crate::submission::{compose, RawSubmission, RequestMeta, SanitizedFields};
use crate::web::response::{error_response, preflight_response, success_response};
use crate::{Config, SubmissionError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cors: Arc<CorsPolicy>,
    pub limiter: RateLimiter,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// State with an in-memory rate-limit store.
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let limiter = RateLimiter::in_memory(config.rate_limit_max, config.rate_limit_window());
        Self::with_limiter(config, mailer, limiter)
    }

    /// State backed by an external rate-limit store.
    pub fn with_store(
        config: Config,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn RateLimitStore>,
    ) -> Self {
        let limiter = RateLimiter::new(store, config.rate_limit_max, config.rate_limit_window());
        Self::with_limiter(config, mailer, limiter)
    }

    fn with_limiter(config: Config, mailer: Arc<dyn Mailer>, limiter: RateLimiter) -> Self {
        Self {
            cors: Arc::new(CorsPolicy::new(config.allowed_origins.clone())),
            config: Arc::new(config),
            limiter,
            mailer,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Submission
// =============================================================================

enum Outcome {
    Preflight,
    Sent { remaining: u32 },
}

/// A terminal error plus the request type, once the body has been read.
struct Failure {
    error: SubmissionError,
    request_type: Option<&'static str>,
}

impl From<SubmissionError> for Failure {
    fn from(error: SubmissionError) -> Self {
        Self {
            error,
            request_type: None,
        }
    }
}

impl Failure {
    fn typed(error: impl Into<SubmissionError>, request_type: &'static str) -> Self {
        Self {
            error: error.into(),
            request_type: Some(request_type),
        }
    }
}

/// Form submission endpoint, mounted as the router fallback.
pub async fn submit(State(state): State<AppState>, request: Request) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let cors_headers = state.cors.headers(origin.as_deref());
    let client_ip = client_key(request.headers());

    match process(&state, request, &client_ip, origin).await {
        Ok(Outcome::Preflight) => preflight_response(cors_headers),
        Ok(Outcome::Sent { remaining }) => success_response(cors_headers, remaining),
        Err(Failure {
            error: err,
            request_type,
        }) => {
            log_failure(&err, &client_ip, request_type.unwrap_or("unknown"));
            error_response(&err, cors_headers)
        }
    }
}

/// One log event per failed request.
fn log_failure(err: &SubmissionError, client_ip: &str, request_type: &str) {
    match err {
        SubmissionError::RateLimited { .. } => {
            warn!(client_ip = %client_ip, request_type = request_type, "rate_limit_exceeded");
        }
        SubmissionError::Delivery(_) => {
            error!(
                client_ip = %client_ip,
                request_type = request_type,
                error = %err,
                "email_delivery_failed"
            );
        }
        SubmissionError::Unknown(_) => {
            error!(
                client_ip = %client_ip,
                request_type = request_type,
                error = %err,
                "submission_failed"
            );
        }
        _ => {
            warn!(
                client_ip = %client_ip,
                request_type = request_type,
                kind = err.kind(),
                error = %err,
                "submission_rejected"
            );
        }
    }
}

async fn process(
    state: &AppState,
    request: Request,
    client_ip: &str,
    origin: Option<String>,
) -> Result<Outcome, Failure> {
    if request.method() == Method::OPTIONS {
        return Ok(Outcome::Preflight);
    }
    if request.method() != Method::POST {
        return Err(SubmissionError::MethodNotAllowed.into());
    }

    let decision = state.limiter.check(client_ip);
    if !decision.allowed {
        return Err(SubmissionError::RateLimited {
            retry_after_secs: state.limiter.window().as_secs(),
        }
        .into());
    }

    let max_body_size = state.config.max_body_size;
    if declared_length(request.headers()).is_some_and(|len| len > max_body_size as u64) {
        return Err(SubmissionError::PayloadTooLarge.into());
    }

    let raw = read_submission(request.into_body(), max_body_size).await?;
    let fields = SanitizedFields::from_submission(&raw);
    let request_type = fields.kind().as_str();

    info!(
        client_ip = %client_ip,
        request_type = request_type,
        has_email = !fields.email.is_empty(),
        has_phone = !fields.phone.is_empty(),
        "submission_received"
    );

    fields
        .validate()
        .map_err(|e| Failure::typed(e, request_type))?;

    let meta = RequestMeta {
        client_ip: client_ip.to_string(),
        origin,
        received_at: Utc::now(),
    };
    let composed = compose(&fields, &raw, &meta);

    let email = OutboundEmail {
        from: state.config.sender_email.clone(),
        to: vec![state.config.target_email.clone()],
        subject: composed.subject,
        text: composed.body,
        reply_to: fields.reply_to().map(str::to_string),
    };

    let id = state
        .mailer
        .send(&email)
        .await
        .map_err(|e| Failure::typed(e, request_type))?;

    info!(
        email_id = %id,
        client_ip = %client_ip,
        request_type = request_type,
        "email_sent"
    );

    Ok(Outcome::Sent {
        remaining: decision.remaining,
    })
}

/// `Content-Length` as declared by the client; unparseable values are ignored.
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn read_submission(body: Body, limit: usize) -> Result<RawSubmission, SubmissionError> {
    // Read errors under the cap only happen on aborted uploads.
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| SubmissionError::PayloadTooLarge)?;
    RawSubmission::from_slice(&bytes).map_err(|e| SubmissionError::Unknown(e.to_string()))
}
