//! Outbound email delivery.
//!
//! The handler only sees [`Mailer`]; [`ResendMailer`] is the production
//! implementation. A failed send is terminal, nothing is retried or queued.

pub mod resend;

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

pub use resend::ResendMailer;

/// A fully addressed email ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email provider API key is not configured")]
    MissingApiKey,

    #[error("email provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("email provider returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Sends one email and returns the provider's delivery id.
pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<String, DeliveryError>>;
}
