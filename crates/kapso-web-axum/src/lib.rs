use axum::{
    Router,
    extract::{RawQuery, State},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use kapso_core::Headers;
use kapso_web_generic::{HeaderConverter, ResponseConverter, VerifyQuery, WebhookProcessor};

#[derive(Clone)]
pub struct AppState {
    pub processor: WebhookProcessor,
}

/// Axum-specific header converter
pub struct AxumHeaderConverter;

impl HeaderConverter for AxumHeaderConverter {
    type HeaderType = HeaderMap;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers {
        headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = axum::response::Response;

    fn from_webhook_response(response: kapso_core::WebhookResponse) -> Self::ResponseType {
        let status = axum::http::StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// Verification handshake: GET /webhook?hub.mode=...
pub async fn verify_webhook(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let query = VerifyQuery::from_query(query.as_deref().unwrap_or_default());
    AxumResponseConverter::from_webhook_response(state.processor.verify(&query))
}

/// Inbound deliveries: POST /webhook
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let generic_headers = AxumHeaderConverter::to_generic_headers(&headers);
    let response = state
        .processor
        .process_webhook(generic_headers, &body)
        .await;
    AxumResponseConverter::from_webhook_response(response)
}

/// Router serving both halves of the webhook on `path`. Other methods get 405.
pub fn router(path: &str, state: AppState) -> Router {
    Router::new()
        .route(path, get(verify_webhook).post(receive_webhook))
        .with_state(state)
}
