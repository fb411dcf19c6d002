//! Send a text, a button message and optionally an image through Kapso.
//!
//! ```text
//! KAPSO_API_KEY=... KAPSO_PHONE_NUMBER_ID=... \
//!     cargo run --example send_initial_message -- --to 521234567890 [--with-image]
//! ```
use config::ConfigError;
use kapso_client::KapsoClient;
use kapso_core::{MAX_BUTTONS, MessageSender, OutboundMessage, ReplyButton, SendRequest};
use kapsokit::{AppConfig, init_tracing};

use std::env;
use std::time::Duration;

/// Recipient shipped in the docs; never a real number.
const PLACEHOLDER_PHONE: &str = "1234567890";
const DELAY: Duration = Duration::from_secs(2);
const SAMPLE_IMAGE: &str = "https://picsum.photos/800/600";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    let Some(run) = prepare(&config, arg_or_env("--to", "KAPSO_TEST_PHONE"))? else {
        eprintln!("Refusing to send to the placeholder number {PLACEHOLDER_PHONE}.");
        eprintln!("Pass --to or set KAPSO_TEST_PHONE (country code + number, e.g. 521234567890).");
        return Ok(());
    };
    let with_image = env::args().any(|a| a == "--with-image");
    let Run {
        client,
        phone_number_id,
        to,
    } = run;
    let phone_number_id = phone_number_id.as_str();

    println!("--- Text message ---");
    let text = OutboundMessage::text(&to, "¡Hola! Este es un mensaje de prueba desde Kapso. 👋");
    send(&client, phone_number_id, &text).await?;

    tokio::time::sleep(DELAY).await;

    println!("--- Button message ---");
    let buttons = [
        ("info", "Más información"),
        ("contact", "Contactar"),
        ("support", "Soporte"),
    ]
    .into_iter()
    .take(MAX_BUTTONS)
    .map(|(id, title)| ReplyButton::truncated(id, title))
    .collect();
    let interactive = OutboundMessage::buttons(&to, "¿En qué podemos ayudarte hoy?", buttons)?;
    send(&client, phone_number_id, &interactive).await?;

    if with_image {
        tokio::time::sleep(DELAY).await;

        println!("--- Image message ---");
        let caption = Some("Esta es una imagen de ejemplo 📸".to_string());
        let image = OutboundMessage::image(&to, SAMPLE_IMAGE, caption)?;
        send(&client, phone_number_id, &image).await?;
    }

    println!("All messages sent; check WhatsApp on {to}.");
    Ok(())
}

/// Validated inputs for one run.
struct Run {
    client: KapsoClient,
    phone_number_id: String,
    to: String,
}

/// Check the required configuration, then the recipient. `Ok(None)` means
/// the recipient is still the placeholder and nothing should be sent.
fn prepare(config: &AppConfig, to: Option<String>) -> Result<Option<Run>, ConfigError> {
    let client = config.kapso.client()?;
    let phone_number_id = config.kapso.require_phone_number_id()?.to_string();

    let to = to.unwrap_or_else(|| PLACEHOLDER_PHONE.into());
    if to == PLACEHOLDER_PHONE {
        return Ok(None);
    }
    Ok(Some(Run {
        client,
        phone_number_id,
        to,
    }))
}

async fn send(
    client: &KapsoClient,
    phone_number_id: &str,
    message: &OutboundMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let res = client
        .send(SendRequest {
            phone_number_id,
            message,
        })
        .await?;
    println!(
        "Sent {} via {} with id {}\nRaw: {}",
        message.kind(),
        res.provider,
        res.id,
        serde_json::to_string_pretty(&res.raw)?
    );
    Ok(())
}

fn arg_or_env(flag: &str, env_key: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(idx) = args.iter().position(|a| a == flag) {
        if idx + 1 < args.len() {
            return Some(args[idx + 1].clone());
        }
    }
    env::var(env_key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.kapso.api_key = Some("key".into());
        config.kapso.phone_number_id = Some("pnid".into());
        config
    }

    #[test]
    fn missing_api_key_fails_before_recipient_check() {
        let mut config = configured();
        config.kapso.api_key = None;
        assert!(matches!(prepare(&config, None), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn missing_phone_number_id_fails() {
        let mut config = configured();
        config.kapso.phone_number_id = None;
        assert!(matches!(
            prepare(&config, Some("521234567890".into())),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn placeholder_recipient_sends_nothing() {
        assert!(prepare(&configured(), None).unwrap().is_none());
        assert!(prepare(&configured(), Some(PLACEHOLDER_PHONE.into())).unwrap().is_none());
    }

    #[test]
    fn real_recipient_is_prepared() {
        let run = prepare(&configured(), Some("521234567890".into()))
            .unwrap()
            .unwrap();
        assert_eq!(run.to, "521234567890");
        assert_eq!(run.phone_number_id, "pnid");
    }
}
