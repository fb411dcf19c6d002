//! # Kapso Core
//!
//! Core traits and types for the kapsokit WhatsApp integration.
//!
//! This crate provides the fundamental building blocks shared by the
//! provider client and the webhook service:
//! - [`MessageSender`] trait for sending WhatsApp messages
//! - [`InboundWebhook`] trait for parsing incoming webhooks
//! - [`OutboundMessage`] tagged message kinds (text, buttons, image)
//! - Common types for requests, responses, and errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use kapso_core::{MessageSender, OutboundMessage, SendRequest};
//!
//! let message = OutboundMessage::text("5215512345678", "Hola!");
//! let response = client
//!     .send(SendRequest {
//!         phone_number_id: "1234567890",
//!         message: &message,
//!     })
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

mod message;

pub use message::{MAX_BUTTON_TITLE_CHARS, MAX_BUTTONS, MessageContent, OutboundMessage, ReplyButton};

/// Errors that can occur while talking to the messaging provider
#[derive(Debug, thiserror::Error)]
pub enum KapsoError {
    /// HTTP communication error
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid request parameters
    #[error("invalid request: {0}")]
    Invalid(String),
    /// Provider returned an error
    #[error("provider error: {0}")]
    Provider(String),
}

/// Web-specific error types for webhook processing
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("provider error: {0}")]
    Kapso(#[from] KapsoError),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
    Forbidden = 403,
    MethodNotAllowed = 405,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SendRequest<'a> {
    /// WhatsApp Business phone number the message is sent from.
    pub phone_number_id: &'a str,
    pub message: &'a OutboundMessage,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the backend/provider that produced the response, e.g. "kapso".
    pub provider: &'static str,
    /// Raw provider payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Which kind of user input produced an [`InboundMessage`] body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    Text,
    ButtonReply,
}

/// Normalized inbound message carrying the single plain-text body the
/// conversation flow consumes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: Option<String>,
    /// Sender phone number; the lead key.
    pub from: String,
    /// Business phone number the message was addressed to.
    pub phone_number_id: String,
    /// Literal text, or the selected button id.
    pub body: String,
    pub kind: InboundKind,
    pub contact_name: Option<String>,
    pub timestamp: Option<OffsetDateTime>,
    pub is_new_conversation: bool,
    pub provider: &'static str,
}

/// What a webhook delivery carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A message the conversation flow consumes.
    Message(InboundMessage),
    /// The payload has no message at all.
    Empty,
    /// A message of a type the flow does not handle, e.g. "image".
    Unsupported(String),
}

impl Inbound {
    pub fn into_message(self) -> Option<InboundMessage> {
        match self {
            Inbound::Message(message) => Some(message),
            Inbound::Empty | Inbound::Unsupported(_) => None,
        }
    }
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    /// Plain-text response with the given status.
    pub fn text(status: HttpStatus, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::text(HttpStatus::Ok, body)
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self {
            status,
            body: format!(r#"{{"error": "{}"}}"#, message.replace('"', r#"\""#)),
            content_type: "application/json".to_string(),
        }
    }
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a single WhatsApp message.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, KapsoError>;
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

/// Lightweight header representation to avoid tying the core to any HTTP framework.
pub type Headers = Vec<(String, String)>;

/// Provider-agnostic inbound webhook interface.
pub trait InboundWebhook: Send + Sync {
    /// Parse the incoming HTTP payload (headers + raw body).
    fn parse_inbound(&self, headers: &Headers, body: &[u8]) -> Result<Inbound, KapsoError>;
}
