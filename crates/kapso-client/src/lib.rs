//! Kapso WhatsApp Cloud API client.
//!
//! [`KapsoClient`] sends messages through the provider's send-message
//! endpoint; [`KapsoWebhook`] turns Kapso webhook deliveries into
//! normalized [`kapso_core::InboundMessage`]s.

use async_trait::async_trait;
use kapso_core::{KapsoError, MessageSender, SendRequest, SendResponse};
use tracing::{debug, instrument};

mod inbound;

pub use inbound::{
    ButtonReply, KapsoConversation, KapsoInbound, KapsoInboundMessage, KapsoInteractive,
    KapsoText, KapsoWebhook,
};

const PROVIDER: &str = "kapso";

/// Default Kapso proxy in front of the Meta Graph API.
pub const DEFAULT_BASE_URL: &str = "https://api.kapso.ai/meta/whatsapp";
/// Graph API version used in the send-message path.
pub const DEFAULT_API_VERSION: &str = "v21.0";

/// How the API key is presented to the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// `X-API-Key: <key>`
    #[default]
    ApiKeyHeader,
    /// `Authorization: Bearer <key>`
    Bearer,
}

/// Kapso REST client.
#[derive(Clone, Debug)]
pub struct KapsoClient {
    api_key: String,
    /// API base URL; override for testing/mocking.
    pub base_url: String,
    /// Path segment between the base URL and the phone number id, if any.
    pub api_version: Option<String>,
    pub auth: AuthScheme,
    http: reqwest::Client,
}

impl KapsoClient {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url<S: Into<String>>(api_key: S, base_url: String) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            api_version: Some(DEFAULT_API_VERSION.to_string()),
            auth: AuthScheme::default(),
            http: reqwest::Client::new(),
        }
    }

    /// `None` sends to `{base_url}/{phone_number_id}/messages`.
    pub fn api_version(mut self, version: Option<String>) -> Self {
        self.api_version = version.filter(|v| !v.is_empty());
        self
    }

    pub fn auth_scheme(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    /// Reuse an existing reqwest client (connection pool, timeouts).
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn messages_url(&self, phone_number_id: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.api_version {
            Some(version) => format!("{base}/{version}/{phone_number_id}/messages"),
            None => format!("{base}/{phone_number_id}/messages"),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            AuthScheme::ApiKeyHeader => builder.header("X-API-Key", &self.api_key),
            AuthScheme::Bearer => builder.bearer_auth(&self.api_key),
        }
    }
}

#[async_trait]
impl MessageSender for KapsoClient {
    #[instrument(skip(self, req), fields(to = %req.message.to(), kind = req.message.kind()))]
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, KapsoError> {
        if req.phone_number_id.is_empty() {
            return Err(KapsoError::Invalid("phone_number_id is required".into()));
        }
        let url = self.messages_url(req.phone_number_id);
        debug!(%url, payload = %serde_json::to_string(req.message).unwrap_or_default(), "sending message");

        let res = self
            .authorize(self.http.post(url))
            .json(req.message)
            .send()
            .await
            .map_err(|e| KapsoError::Http(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(KapsoError::Auth(format!("HTTP {}: {}", status, body)));
            }
            return Err(KapsoError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let raw_text = res
            .text()
            .await
            .map_err(|e| KapsoError::Http(e.to_string()))?;
        let raw_json: serde_json::Value = serde_json::from_str(&raw_text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw_text }));

        let id = raw_json
            .get("messages")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|m| m.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(kapso_core::fallback_id);

        Ok(SendResponse {
            id,
            provider: PROVIDER,
            raw: raw_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_includes_version_by_default() {
        let client = KapsoClient::new("key");
        assert_eq!(
            client.messages_url("123"),
            "https://api.kapso.ai/meta/whatsapp/v21.0/123/messages"
        );
    }

    #[test]
    fn messages_url_without_version_and_trailing_slash() {
        let client =
            KapsoClient::with_base_url("key", "http://localhost:9000/".into()).api_version(None);
        assert_eq!(client.messages_url("123"), "http://localhost:9000/123/messages");
    }

    #[test]
    fn empty_version_is_treated_as_none() {
        let client = KapsoClient::new("key").api_version(Some(String::new()));
        assert!(client.api_version.is_none());
    }

    #[test]
    fn api_key_header_is_default_auth() {
        let client = KapsoClient::new("key");
        assert_eq!(client.auth, AuthScheme::ApiKeyHeader);
    }

    #[tokio::test]
    async fn send_requires_phone_number_id() {
        let client = KapsoClient::with_base_url("key", "http://127.0.0.1:9".into());
        let message = kapso_core::OutboundMessage::text("521", "hola");
        let err = client
            .send(SendRequest {
                phone_number_id: "",
                message: &message,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KapsoError::Invalid(_)));
    }
}
