//! Lead-qualification webhook server.
//!
//! Requires `KAPSO_API_KEY`, `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`;
//! see `AppConfig` for the remaining settings.

use kapso_web_axum::{AppState, router};
use kapsokit::{AppConfig, build_processor, init_tracing};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    let processor = build_processor(&config)?;
    let app = router(&config.webhook.path, AppState { processor });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, path = %config.webhook.path, "webhook listening");

    axum::serve(listener, app).await?;
    Ok(())
}
