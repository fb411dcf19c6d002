use std::sync::Arc;

use kapso_core::{
    Headers, HttpStatus, Inbound, InboundMessage, InboundWebhook, MessageSender, SendRequest,
    WebhookError, WebhookResponse,
};
use kapso_leads::{ConversationState, LeadStore, LeadUpdate, Step, Transition, advance};
use serde::Deserialize;
use tracing::{error, info, warn};

/// Token expected in `hub.verify_token` when none is configured.
pub const DEFAULT_VERIFY_TOKEN: &str = "KAPSO_WEBHOOK_TOKEN";

/// Query parameters of the provider's verification handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl VerifyQuery {
    /// Decode a raw query string; anything undecodable counts as absent.
    pub fn from_query(raw: &str) -> Self {
        serde_urlencoded::from_str(raw).unwrap_or_default()
    }
}

/// Framework-agnostic webhook processor that runs the lead flow
#[derive(Clone)]
pub struct WebhookProcessor {
    inbound: Arc<dyn InboundWebhook>,
    store: Arc<dyn LeadStore>,
    sender: Arc<dyn MessageSender>,
    verify_token: String,
}

impl WebhookProcessor {
    pub fn new(
        inbound: Arc<dyn InboundWebhook>,
        store: Arc<dyn LeadStore>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            inbound,
            store,
            sender,
            verify_token: DEFAULT_VERIFY_TOKEN.to_string(),
        }
    }

    pub fn with_verify_token(mut self, token: impl Into<String>) -> Self {
        self.verify_token = token.into();
        self
    }

    /// Dispatch one HTTP request by method.
    pub async fn handle_request(
        &self,
        method: &str,
        query: &str,
        headers: Headers,
        body: &[u8],
    ) -> WebhookResponse {
        if method.eq_ignore_ascii_case("GET") {
            self.verify(&VerifyQuery::from_query(query))
        } else if method.eq_ignore_ascii_case("POST") {
            self.process_webhook(headers, body).await
        } else {
            WebhookResponse::text(HttpStatus::MethodNotAllowed, "Method not allowed")
        }
    }

    /// Answer the verification handshake.
    pub fn verify(&self, query: &VerifyQuery) -> WebhookResponse {
        let subscribed = query.mode.as_deref() == Some("subscribe")
            && query.verify_token.as_deref() == Some(self.verify_token.as_str());
        if subscribed {
            info!("webhook verified");
            WebhookResponse::ok(query.challenge.clone().unwrap_or_default())
        } else {
            warn!(mode = ?query.mode, "webhook verification rejected");
            WebhookResponse::text(HttpStatus::Forbidden, "Forbidden")
        }
    }

    /// Process an incoming delivery and return a framework-agnostic response.
    ///
    /// Anything that goes wrong after the payload is parsed is logged and
    /// still acknowledged with 200, so the provider does not redeliver.
    pub async fn process_webhook(&self, headers: Headers, body: &[u8]) -> WebhookResponse {
        let message = match self.inbound.parse_inbound(&headers, body) {
            Ok(Inbound::Message(message)) => message,
            Ok(Inbound::Empty) => return WebhookResponse::ok("No message"),
            Ok(Inbound::Unsupported(_)) => return WebhookResponse::ok("OK"),
            Err(e) => {
                warn!(error = %e, "undecodable webhook payload");
                return WebhookResponse::error(
                    HttpStatus::BadRequest,
                    &format!("parse error: {}", e),
                );
            }
        };

        if let Err(e) = self.handle_message(&message).await {
            error!(from = %message.from, error = %e, "message processing aborted");
        }
        WebhookResponse::ok("OK")
    }

    /// Run one message through the flow: load or create the lead, advance,
    /// persist, reply. Returns the step the lead is left in.
    ///
    /// A storage failure aborts before any reply is sent. A failed send is
    /// logged and not retried.
    pub async fn handle_message(&self, message: &InboundMessage) -> Result<Step, WebhookError> {
        let from = message.from.as_str();
        info!(%from, body = %message.body, "message received");

        let record = match self.store.find_by_phone(from).await.map_err(storage)? {
            Some(record) => record,
            None => {
                info!(%from, "new lead");
                self.store
                    .create(from, &ConversationState::default())
                    .await
                    .map_err(storage)?
            }
        };

        let current = record.conversation_state;
        info!(%from, step = %current.step, "current state");

        let Transition { state, reply } = advance(&current, &message.body);
        self.store
            .upsert(from, &LeadUpdate::from(&state))
            .await
            .map_err(storage)?;
        info!(%from, step = %state.step, "lead updated");

        let outbound = reply.into_message(from)?;
        match self
            .sender
            .send(SendRequest {
                phone_number_id: &message.phone_number_id,
                message: &outbound,
            })
            .await
        {
            Ok(sent) => info!(%from, id = %sent.id, "reply sent"),
            Err(e) => error!(%from, error = %e, "failed to send reply"),
        }

        Ok(state.step)
    }
}

fn storage(e: kapso_leads::StoreError) -> WebhookError {
    WebhookError::Storage(e.to_string())
}

/// Helper trait for framework adapters to convert headers
pub trait HeaderConverter {
    type HeaderType;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers;
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}
