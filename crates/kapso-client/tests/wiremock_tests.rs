//! Integration tests for the Kapso client using WireMock
//!
//! These tests mock the Kapso send-message endpoint to verify request shape,
//! authentication headers and response handling.

use kapso_client::{AuthScheme, KapsoClient};
use kapso_core::{KapsoError, MessageSender, OutboundMessage, ReplyButton, SendRequest};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

fn send_success_response() -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "contacts": [{ "input": "5215512345678", "wa_id": "5215512345678" }],
        "messages": [{ "id": "wamid.HBgNNTIxNTUxMjM0NTY3OBUCABEYEjA=" }]
    })
}

async fn send(client: &KapsoClient, message: &OutboundMessage) -> Result<kapso_core::SendResponse, KapsoError> {
    client
        .send(SendRequest {
            phone_number_id: "123456789",
            message,
        })
        .await
}

#[tokio::test]
async fn sends_text_with_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v21.0/123456789/messages"))
        .and(header("X-API-Key", "test_api_key"))
        .and(body_json(serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": "5215512345678",
            "type": "text",
            "text": { "preview_url": false, "body": "Hola" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(send_success_response()))
        .expect(1)
        .mount(&server)
        .await;

    let client = KapsoClient::with_base_url("test_api_key", server.uri());
    let response = send(&client, &OutboundMessage::text("5215512345678", "Hola"))
        .await
        .unwrap();

    assert_eq!(response.provider, "kapso");
    assert!(response.id.starts_with("wamid."));
}

#[tokio::test]
async fn sends_buttons_with_bearer_auth_and_no_version() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/123456789/messages"))
        .and(header("Authorization", "Bearer test_api_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(send_success_response()))
        .expect(1)
        .mount(&server)
        .await;

    let client = KapsoClient::with_base_url("test_api_key", server.uri())
        .api_version(None)
        .auth_scheme(AuthScheme::Bearer);
    let message = OutboundMessage::buttons(
        "5215512345678",
        "¿En qué podemos ayudarte hoy?",
        vec![
            ReplyButton::truncated("info", "Más información"),
            ReplyButton::truncated("contact", "Contactar"),
        ],
    )
    .unwrap();

    assert!(send(&client, &message).await.is_ok());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["type"], "interactive");
    assert_eq!(body["interactive"]["action"]["buttons"][0]["reply"]["id"], "info");
}

#[tokio::test]
async fn provider_error_is_returned() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 131030, "message": "Recipient phone number not in allowed list" }
        })))
        .mount(&server)
        .await;

    let client = KapsoClient::with_base_url("test_api_key", server.uri());
    let err = send(&client, &OutboundMessage::text("1", "x")).await.unwrap_err();

    match err {
        KapsoError::Provider(msg) => {
            assert!(msg.contains("400"));
            assert!(msg.contains("131030"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = KapsoClient::with_base_url("wrong", server.uri());
    let err = send(&client, &OutboundMessage::text("1", "x")).await.unwrap_err();
    assert!(matches!(err, KapsoError::Auth(_)));
}

#[tokio::test]
async fn missing_message_id_falls_back_to_generated_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .mount(&server)
        .await;

    let client = KapsoClient::with_base_url("test_api_key", server.uri());
    let response = send(&client, &OutboundMessage::text("1", "x")).await.unwrap();

    assert!(!response.id.is_empty());
    assert_eq!(response.raw["raw"], "accepted");
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = KapsoClient::with_base_url("test_api_key", uri);
    let err = send(&client, &OutboundMessage::text("1", "x")).await.unwrap_err();
    assert!(matches!(err, KapsoError::Http(_)));
}
