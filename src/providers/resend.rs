//! Resend adapter.
//!
//! Maps a [`StructuredMessage`] onto Resend's `POST /emails` API. Resend
//! accepts raw RFC-5322-style address strings, so header values pass through
//! without re-parsing.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};
use crate::message::StructuredMessage;
use crate::providers::MailProvider;

const PROVIDER_NAME: &str = "resend";

/// Default Resend API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.resend.com";

/// Outbound adapter for the Resend email API.
#[derive(Debug, Clone)]
pub struct ResendProvider {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl ResendProvider {
    /// Creates an adapter against the production Resend endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    /// Creates an adapter against a custom endpoint (used by tests).
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key.into()),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Wire request for `POST /emails`.
///
/// Optional fields are omitted entirely when absent rather than sent empty.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    #[serde(skip_serializing_if = "slice_is_empty")]
    cc: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

fn slice_is_empty(slice: &[String]) -> bool {
    slice.is_empty()
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[async_trait]
impl MailProvider for ResendProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn send(&self, message: &StructuredMessage) -> RelayResult<String> {
        let request = SendEmailRequest {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            cc: &message.cc,
            reply_to: message.reply_to.as_deref(),
            html: message.body.html(),
            text: message.body.text(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.endpoint))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::provider_transport(PROVIDER_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::provider_rejected(
                PROVIDER_NAME,
                status.as_u16(),
                body,
            ));
        }

        let body: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| RelayError::provider_transport(PROVIDER_NAME, e))?;

        #[cfg(feature = "tracing")]
        tracing::info!(id = %body.id, "resend accepted message");

        Ok(body.id)
    }
}
