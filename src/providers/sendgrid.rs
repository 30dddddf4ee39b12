//! SendGrid adapter.
//!
//! Maps a [`StructuredMessage`] onto SendGrid's `POST /v3/mail/send` API.
//! SendGrid requires structured addresses, so `from`, `reply_to`, and every
//! `to`/`cc` entry is parsed into a name/address pair first; any malformed
//! address fails the whole send attempt before an HTTP request is made.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::{RelayError, RelayResult};
use crate::message::StructuredMessage;
use crate::providers::{Address, MailProvider};

const PROVIDER_NAME: &str = "sendgrid";

/// Default SendGrid API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.sendgrid.com";

/// Response header carrying the provider-assigned message identifier.
const MESSAGE_ID_HEADER: &str = "X-Message-Id";

/// Outbound adapter for the SendGrid v3 mail API.
#[derive(Debug, Clone)]
pub struct SendGridProvider {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl SendGridProvider {
    /// Creates an adapter against the production SendGrid endpoint.
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

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<Address> for EmailAddress {
    fn from(address: Address) -> Self {
        Self {
            email: address.email,
            name: address.name,
        }
    }
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<Vec<EmailAddress>>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

/// Wire request for `POST /v3/mail/send`.
#[derive(Debug, Serialize)]
struct MailSendRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
}

/// Builds the wire request, parsing every address field.
///
/// Returns an [`RelayError::AddressFormat`] naming the offending field when
/// any address cannot be parsed; nothing is sent in that case.
fn build_request(message: &StructuredMessage) -> RelayResult<MailSendRequest> {
    let from = Address::parse("from", &message.from)?.into();

    let reply_to = match &message.reply_to {
        Some(raw) => Some(Address::parse("reply-to", raw)?.into()),
        None => None,
    };

    let mut to = Vec::with_capacity(message.to.len());
    for raw in &message.to {
        to.push(Address::parse("to", raw)?.into());
    }

    let mut cc = Vec::with_capacity(message.cc.len());
    for raw in &message.cc {
        cc.push(Address::parse("cc", raw)?.into());
    }

    let content = match (message.body.text(), message.body.html()) {
        (Some(text), _) => vec![Content {
            content_type: "text/plain",
            value: text.to_string(),
        }],
        (_, Some(html)) => vec![Content {
            content_type: "text/html",
            value: html.to_string(),
        }],
        // Unreachable by construction: a body is always one of the two.
        (None, None) => vec![],
    };

    Ok(MailSendRequest {
        personalizations: vec![Personalization {
            to,
            cc: (!cc.is_empty()).then_some(cc),
        }],
        from,
        reply_to,
        subject: message.subject.clone(),
        content,
    })
}

#[async_trait]
impl MailProvider for SendGridProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn send(&self, message: &StructuredMessage) -> RelayResult<String> {
        let request = build_request(message)?;

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.endpoint))
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

        // SendGrid returns 202 with an empty body; the id lives in a header.
        let id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        #[cfg(feature = "tracing")]
        tracing::info!(id = %id, "sendgrid accepted message");

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBody;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_message() -> StructuredMessage {
        StructuredMessage {
            subject: "Hi".to_string(),
            from: "Alice <a@x.com>".to_string(),
            reply_to: None,
            to: vec!["Bob <b@y.com>".to_string(), "c@y.com".to_string()],
            cc: vec!["copy@z.com".to_string()],
            body: MessageBody::Text("Hello there".to_string()),
        }
    }

    #[test]
    fn builds_personalization_with_parsed_pairs() {
        let request = build_request(&sample_message()).unwrap();

        assert_eq!(request.from.email, "a@x.com");
        assert_eq!(request.from.name.as_deref(), Some("Alice"));

        let personalization = &request.personalizations[0];
        assert_eq!(personalization.to.len(), 2);
        assert_eq!(personalization.to[0].email, "b@y.com");
        assert_eq!(personalization.to[0].name.as_deref(), Some("Bob"));
        assert_eq!(personalization.to[1].email, "c@y.com");
        assert_eq!(personalization.to[1].name, None);

        let cc = personalization.cc.as_ref().unwrap();
        assert_eq!(cc.len(), 1);
        assert_eq!(cc[0].email, "copy@z.com");

        assert_eq!(request.content[0].content_type, "text/plain");
        assert_eq!(request.content[0].value, "Hello there");
    }

    #[test]
    fn html_body_maps_to_html_content() {
        let mut message = sample_message();
        message.body = MessageBody::Html("<p>hi</p>".to_string());

        let request = build_request(&message).unwrap();
        assert_eq!(request.content.len(), 1);
        assert_eq!(request.content[0].content_type, "text/html");
    }

    #[test]
    fn empty_cc_is_omitted() {
        let mut message = sample_message();
        message.cc.clear();

        let request = build_request(&message).unwrap();
        assert!(request.personalizations[0].cc.is_none());
    }

    #[tokio::test]
    async fn unparsable_from_fails_without_an_http_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let mut message = sample_message();
        message.from = "not-an-address".to_string();

        let provider = SendGridProvider::with_endpoint("SG.test", server.uri());
        let err = provider.send(&message).await.unwrap_err();

        assert!(matches!(
            err,
            RelayError::AddressFormat { field: "from", .. }
        ));
    }

    #[tokio::test]
    async fn sends_request_and_reads_id_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("Authorization", "Bearer SG.test"))
            .and(body_partial_json(serde_json::json!({
                "from": {"email": "a@x.com", "name": "Alice"},
                "subject": "Hi",
                "personalizations": [{
                    "to": [
                        {"email": "b@y.com", "name": "Bob"},
                        {"email": "c@y.com"},
                    ],
                    "cc": [{"email": "copy@z.com"}],
                }],
                "content": [{"type": "text/plain", "value": "Hello there"}],
            })))
            .respond_with(
                ResponseTemplate::new(202).insert_header("X-Message-Id", "sg-msg-42"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = SendGridProvider::with_endpoint("SG.test", server.uri());
        let id = provider.send(&sample_message()).await.unwrap();
        assert_eq!(id, "sg-msg-42");
    }

    #[tokio::test]
    async fn missing_id_header_yields_empty_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let provider = SendGridProvider::with_endpoint("SG.test", server.uri());
        let id = provider.send(&sample_message()).await.unwrap();
        assert_eq!(id, "");
    }

    #[tokio::test]
    async fn rejection_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider = SendGridProvider::with_endpoint("SG.test", server.uri());
        let err = provider.send(&sample_message()).await.unwrap_err();

        match err {
            RelayError::Provider { provider, status, .. } => {
                assert_eq!(provider, "sendgrid");
                assert_eq!(status, Some(401));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
