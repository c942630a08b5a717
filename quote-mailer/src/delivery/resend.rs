//! Resend transactional email client.
//!
//! Reference: https://resend.com/docs/api-reference/emails/send-email

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use super::{DeliveryError, Mailer, OutboundEmail};
use crate::Config;

/// Response body of a successful send.
#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: Option<String>,
    endpoint: Url,
}

impl ResendMailer {
    pub fn new(client: Client, api_key: Option<String>, base_url: &Url) -> Self {
        Self {
            client,
            api_key,
            endpoint: emails_endpoint(base_url),
        }
    }

    /// Build a mailer with its own HTTP client, using the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(config.resend_timeout()).build()?;
        Ok(Self::new(
            client,
            config.resend_api_key.clone(),
            &config.resend_api_url,
        ))
    }

    async fn send_email(&self, email: &OutboundEmail) -> Result<String, DeliveryError> {
        let api_key = self.api_key.as_deref().ok_or(DeliveryError::MissingApiKey)?;

        info!(
            endpoint = %self.endpoint,
            subject = %email.subject,
            has_reply_to = email.reply_to.is_some(),
            body_length = email.text.len(),
            "resend_send_starting"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            warn!(
                status_code = status.as_u16(),
                body_preview = %preview,
                "resend_send_rejected"
            );
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::InvalidResponse(e.to_string()))?;

        info!(email_id = %parsed.id, "resend_send_complete");

        Ok(parsed.id)
    }
}

impl Mailer for ResendMailer {
    fn send<'a>(
        &'a self,
        email: &'a OutboundEmail,
    ) -> BoxFuture<'a, Result<String, DeliveryError>> {
        self.send_email(email).boxed()
    }
}

/// `{base}/emails`, keeping any path prefix on the base URL.
fn emails_endpoint(base: &Url) -> Url {
    let mut endpoint = base.clone();
    let path = format!("{}/emails", base.path().trim_end_matches('/'));
    endpoint.set_path(&path);
    endpoint
}
