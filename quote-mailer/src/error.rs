//! Failure taxonomy for the submission endpoint.
//!
//! Every variant is terminal for the request and maps to a fixed French
//! message. Internal detail stays in the logs.

use axum::http::StatusCode;
use thiserror::Error;

use crate::delivery::DeliveryError;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid phone number")]
    InvalidPhone,

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl SubmissionError {
    pub fn status(&self) -> StatusCode {
        match self {
            SubmissionError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SubmissionError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubmissionError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            SubmissionError::InvalidEmail | SubmissionError::InvalidPhone => {
                StatusCode::BAD_REQUEST
            }
            SubmissionError::Delivery(_) | SubmissionError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the visitor.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmissionError::MethodNotAllowed => "Method Not Allowed",
            SubmissionError::RateLimited { .. } => {
                "Trop de demandes. Veuillez réessayer plus tard."
            }
            SubmissionError::PayloadTooLarge => "Requête trop volumineuse",
            SubmissionError::InvalidEmail => "Format d'email invalide",
            SubmissionError::InvalidPhone => "Format de téléphone invalide",
            SubmissionError::Delivery(_) | SubmissionError::Unknown(_) => {
                "Erreur lors de l'envoi de l'email. Veuillez réessayer."
            }
        }
    }

    /// Stable identifier used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::MethodNotAllowed => "method_not_allowed",
            SubmissionError::RateLimited { .. } => "rate_limited",
            SubmissionError::PayloadTooLarge => "payload_too_large",
            SubmissionError::InvalidEmail | SubmissionError::InvalidPhone => "validation",
            SubmissionError::Delivery(_) => "delivery_failure",
            SubmissionError::Unknown(_) => "unknown",
        }
    }
}
