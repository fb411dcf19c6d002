//! # Kapso Kit
//!
//! WhatsApp messaging through the Kapso Cloud API proxy, with a webhook that
//! qualifies leads over a short scripted conversation and keeps them in
//! Supabase.
//!
//! ## Features
//!
//! - **Outbound messages**: text, reply buttons and images via [`kapso_client::KapsoClient`]
//! - **Lead flow**: name, email and interest collected by [`kapso_leads::advance`]
//! - **Webhook**: verification handshake and inbound processing, served with Axum
//! - **Storage**: Supabase (PostgREST) or in-memory lead stores
//! - **Configuration**: layered files and environment variables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kapsokit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = config.kapso.client()?;
//!
//!     let message = OutboundMessage::text("5215512345678", "¡Hola!");
//!     let response = client
//!         .send(SendRequest {
//!             phone_number_id: config.kapso.require_phone_number_id()?,
//!             message: &message,
//!         })
//!         .await?;
//!
//!     println!("Message sent with ID: {}", response.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod telemetry;

use std::sync::Arc;

use ::config::ConfigError;
use kapso_client::KapsoWebhook;
use kapso_web_generic::WebhookProcessor;

pub use crate::config::*;
pub use telemetry::init_tracing;

/// Wire the production webhook: Kapso payloads in, Supabase storage, Kapso replies out.
pub fn build_processor(config: &AppConfig) -> Result<WebhookProcessor, ConfigError> {
    let client = config.kapso.client()?;
    let store = config.supabase.store()?;
    Ok(
        WebhookProcessor::new(Arc::new(KapsoWebhook), Arc::new(store), Arc::new(client))
            .with_verify_token(config.webhook.verify_token.clone()),
    )
}

/// Common imports for Kapso Kit usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, KapsoConfig, LoggingConfig, ServerConfig, SupabaseConfig, WebhookConfig,
    };
    pub use crate::{build_processor, init_tracing};
    pub use kapso_client::{AuthScheme, KapsoClient, KapsoWebhook};
    pub use kapso_core::*;
    pub use kapso_leads::{ConversationState, LeadStore, MemoryLeadStore, Step, advance};
    pub use kapso_supabase::SupabaseLeadStore;
    pub use kapso_web_axum::{AppState, router};
    pub use kapso_web_generic::WebhookProcessor;
}
