use kapso_core::{Headers, Inbound, InboundKind, InboundMessage, InboundWebhook, KapsoError};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::PROVIDER;

/// Types used to parse Kapso webhook deliveries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KapsoInbound {
    #[serde(default)]
    pub message: Option<KapsoInboundMessage>,
    #[serde(default)]
    pub conversation: Option<KapsoConversation>,
    #[serde(default)]
    pub is_new_conversation: bool,
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KapsoInboundMessage {
    pub from: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<KapsoText>,
    #[serde(default)]
    pub interactive: Option<KapsoInteractive>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Reply context and Kapso processing metadata; carried, never inspected.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub kapso: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KapsoText {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KapsoInteractive {
    #[serde(default)]
    pub button_reply: Option<ButtonReply>,
    #[serde(default)]
    pub list_reply: Option<ButtonReply>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ButtonReply {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KapsoConversation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl KapsoInboundMessage {
    /// The single body the conversation flow consumes: the text for `text`
    /// messages, the selected button id for button replies.
    pub fn body(&self) -> Option<(String, InboundKind)> {
        match self.kind.as_str() {
            "text" => self
                .text
                .as_ref()
                .map(|t| (t.body.clone(), InboundKind::Text)),
            "interactive" => self
                .interactive
                .as_ref()
                .and_then(|i| i.button_reply.as_ref())
                .map(|b| (b.id.clone(), InboundKind::ButtonReply)),
            _ => None,
        }
    }
}

impl KapsoInbound {
    /// Normalize the delivery.
    pub fn into_inbound(self) -> Inbound {
        let Some(message) = self.message else {
            info!("no message in payload");
            return Inbound::Empty;
        };
        let Some((body, kind)) = message.body() else {
            info!(kind = %message.kind, from = %message.from, "unsupported message type");
            return Inbound::Unsupported(message.kind);
        };

        let conversation = self.conversation;
        let phone_number_id = self
            .phone_number_id
            .filter(|id| !id.is_empty())
            .or_else(|| conversation.as_ref().and_then(|c| c.phone_number_id.clone()))
            .unwrap_or_default();
        let timestamp = message
            .timestamp
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok());

        Inbound::Message(InboundMessage {
            id: message.id,
            from: message.from,
            phone_number_id,
            body,
            kind,
            contact_name: conversation.and_then(|c| c.contact_name),
            timestamp,
            is_new_conversation: self.is_new_conversation,
            provider: PROVIDER,
        })
    }
}

/// Inbound side of the Kapso integration.
#[derive(Clone, Copy, Debug, Default)]
pub struct KapsoWebhook;

impl InboundWebhook for KapsoWebhook {
    fn parse_inbound(&self, _headers: &Headers, body: &[u8]) -> Result<Inbound, KapsoError> {
        let inbound: KapsoInbound = serde_json::from_slice(body)
            .map_err(|e| KapsoError::Invalid(format!("json decode: {}", e)))?;
        debug!(?inbound, "webhook received");
        Ok(inbound.into_inbound())
    }
}
