//! HTTP endpoint handlers.
//!
//! Handlers stay thin: extract, delegate to `dispatch`/`optin`, and let
//! `GatewayError`'s `IntoResponse` do all status mapping. Webhook bodies are
//! taken as raw bytes so verification runs over exactly what arrived.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::dispatch::{dispatch, WebhookAck};
use crate::error::{GatewayError, Result};
use crate::event::EventKind;
use crate::optin;
use crate::resend::{ResendClient, SendEmailRequest};
use crate::web::signature::{SignatureVerifier, VerifyError, WebhookEnvelope};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resend: ResendClient,
}

impl AppState {
    pub fn new(config: Config, resend: ResendClient) -> Self {
        Self {
            config: Arc::new(config),
            resend,
        }
    }

    /// Build the verifier for this request, failing as a configuration
    /// error when no usable secret is present.
    fn verifier(&self) -> Result<SignatureVerifier> {
        let secret = self
            .config
            .webhook_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::Configuration("RESEND_WEBHOOK_SECRET is not set".to_string())
            })?;

        SignatureVerifier::new(secret, self.config.webhook_max_age).map_err(|_| {
            GatewayError::Configuration("RESEND_WEBHOOK_SECRET is not a valid secret".to_string())
        })
    }

    fn audience(&self) -> Result<&str> {
        self.config.audience_id.as_deref().ok_or_else(|| {
            GatewayError::Configuration("RESEND_AUDIENCE_ID is not configured".to_string())
        })
    }
}

/// Assemble the signed envelope from transport headers and the raw body.
fn envelope<'a>(headers: &'a HeaderMap, payload: &'a [u8]) -> Result<WebhookEnvelope<'a>> {
    fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| VerifyError::MissingHeader(name).into())
    }

    Ok(WebhookEnvelope {
        id: header(headers, "svix-id")?,
        timestamp: header(headers, "svix-timestamp")?,
        signature: header(headers, "svix-signature")?,
        payload,
    })
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(GatewayError::MalformedRequest(rejection.body_text())),
    }
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Send
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to: String,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub id: String,
}

pub async fn send(
    State(state): State<AppState>,
    body: std::result::Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>> {
    let body = json_body(body)?;

    let email = SendEmailRequest::new(state.config.from_address.as_str(), [body.to], body.subject)
        .with_html(format!("<p>{}</p>", body.message));

    let sent = state.resend.send_email(&email).await?;

    Ok(Json(SendResponse {
        success: true,
        id: sent.id,
    }))
}

// =============================================================================
// Webhook
// =============================================================================

/// General webhook endpoint: verify, decode, dispatch.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let verifier = state.verifier()?;
    let event = verifier.verify_event(&envelope(&headers, &body)?)?;

    info!(event_type = %event.event_type, "webhook_received");

    Ok(Json(dispatch(&state.resend, &event).await))
}

// =============================================================================
// Double Opt-In
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
    pub contact_id: String,
    pub email_id: String,
}

pub async fn double_optin_subscribe(
    State(state): State<AppState>,
    body: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>> {
    let body = json_body(body)?;

    let email = body
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| GatewayError::MalformedRequest("missing email".to_string()))?;

    let audience_id = state.audience()?;

    let receipt = optin::subscribe(
        &state.resend,
        audience_id,
        &state.config.from_address,
        state.config.confirm_redirect_url.as_str(),
        email,
        body.name.as_deref(),
    )
    .await?;

    Ok(Json(SubscribeResponse {
        success: true,
        message: "Confirmation email sent",
        contact_id: receipt.contact_id,
        email_id: receipt.email_id,
    }))
}

/// Acknowledgement for the double opt-in webhook.
#[derive(Serialize)]
pub struct ConfirmAck {
    pub received: bool,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
}

/// Double opt-in webhook: only `email.clicked` enters the confirmation
/// transition; every other verified event is acknowledged and ignored.
pub async fn double_optin_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConfirmAck>> {
    let verifier = state.verifier()?;
    let event = verifier.verify_event(&envelope(&headers, &body)?)?;

    if event.kind() != EventKind::Clicked {
        info!(event_type = %event.event_type, "optin_event_ignored");
        return Ok(Json(ConfirmAck {
            received: true,
            event_type: event.event_type,
            message: Some("Event type ignored"),
            confirmed: None,
            email: None,
            contact_id: None,
        }));
    }

    let audience_id = state.audience()?;
    let recipient = event.recipient()?;

    let contact = optin::confirm(&state.resend, audience_id, recipient).await?;

    Ok(Json(ConfirmAck {
        received: true,
        event_type: event.event_type.clone(),
        message: None,
        confirmed: Some(true),
        email: Some(contact.email),
        contact_id: Some(contact.id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::web::router;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

    fn test_config(base_url: &str, secret: Option<&str>, audience: Option<&str>) -> Config {
        Config {
            port: 0,
            api_key: "re_test_key".to_string(),
            base_url: base_url.to_string(),
            from_address: "Acme <onboarding@resend.dev>".to_string(),
            webhook_secret: secret.map(String::from),
            webhook_max_age: 300,
            audience_id: audience.map(String::from),
            confirm_redirect_url: Url::parse("https://example.com/confirmed").unwrap(),
        }
    }

    fn app(config: Config) -> axum::Router {
        let resend = ResendClient::new(config.api_key.clone(), config.base_url.clone()).unwrap();
        router(AppState::new(config, resend))
    }

    fn now_string() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string()
    }

    fn signed_request(uri: &str, payload: &str, id: &str, timestamp: &str) -> Request<Body> {
        let verifier = SignatureVerifier::new(SECRET, 300).unwrap();
        let signature = format!("v1,{}", verifier.sign(id, timestamp, payload.as_bytes()));

        Request::builder()
            .method("POST")
            .uri(uri)
            .header("svix-id", id)
            .header("svix-timestamp", timestamp)
            .header("svix-signature", signature)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_webhook_missing_headers_is_400() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let request = Request::post("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":"email.sent"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_without_secret_is_500() {
        let app = app(test_config("http://localhost:0", None, None));

        let request = signed_request("/webhook", r#"{"type":"email.sent"}"#, "msg_1", &now_string());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_webhook_valid_event_is_acknowledged() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let payload = r#"{"type":"email.delivered","data":{"to":["a@b.com"]}}"#;
        let request = signed_request("/webhook", payload, "msg_1", &now_string());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"received": true, "type": "email.delivered"})
        );
    }

    #[tokio::test]
    async fn test_webhook_unknown_type_is_acknowledged() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let payload = r#"{"type":"email.brand_new","data":{}}"#;
        let request = signed_request("/webhook", payload, "msg_1", &now_string());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"received": true, "type": "email.brand_new"})
        );
    }

    #[tokio::test]
    async fn test_webhook_stale_timestamp_is_400() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let stale = (SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            - 600)
            .to_string();
        let request = signed_request("/webhook", r#"{"type":"email.sent"}"#, "msg_1", &stale);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_forged_signature_is_400() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let request = Request::post("/webhook")
            .header("svix-id", "msg_1")
            .header("svix-timestamp", now_string())
            .header("svix-signature", "v1,Zm9yZ2VkLXNpZ25hdHVyZQ==")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":"email.sent"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_double_optin_webhook_ignores_other_types() {
        let app = app(test_config("http://localhost:0", Some(SECRET), Some("aud_1")));

        let payload = r#"{"type":"email.delivered","data":{"to":["a@b.com"]}}"#;
        let request = signed_request("/double-optin/webhook", payload, "msg_1", &now_string());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "received": true,
                "type": "email.delivered",
                "message": "Event type ignored"
            })
        );
    }

    #[tokio::test]
    async fn test_double_optin_webhook_confirms_contact() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/audiences/aud_1/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "c1", "email": "a@b.com", "unsubscribed": true}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/audiences/aud_1/contacts/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "contact",
                "id": "c1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(test_config(&server.uri(), Some(SECRET), Some("aud_1")));

        let payload = r#"{"type":"email.clicked","data":{"to":["a@b.com"]}}"#;
        let request = signed_request("/double-optin/webhook", payload, "msg_1", &now_string());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "received": true,
                "type": "email.clicked",
                "confirmed": true,
                "email": "a@b.com",
                "contact_id": "c1"
            })
        );
    }

    #[tokio::test]
    async fn test_double_optin_webhook_unknown_contact_is_404() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/audiences/aud_1/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let app = app(test_config(&server.uri(), Some(SECRET), Some("aud_1")));

        let payload = r#"{"type":"email.clicked","data":{"to":["a@b.com"]}}"#;
        let request = signed_request("/double-optin/webhook", payload, "msg_1", &now_string());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_double_optin_webhook_without_recipient_is_400() {
        let app = app(test_config("http://localhost:0", Some(SECRET), Some("aud_1")));

        let payload = r#"{"type":"email.clicked","data":{}}"#;
        let request = signed_request("/double-optin/webhook", payload, "msg_1", &now_string());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_subscribe_missing_email_is_400() {
        let app = app(test_config("http://localhost:0", Some(SECRET), Some("aud_1")));

        let request = Request::post("/double-optin/subscribe")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Ada"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_subscribe_without_audience_is_500() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let request = Request::post("/double-optin/subscribe")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"new@b.com"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_subscribe_creates_and_sends() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audiences/aud_1/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "contact",
                "id": "c_new"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "em_confirm"})))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(test_config(&server.uri(), Some(SECRET), Some("aud_1")));

        let request = Request::post("/double-optin/subscribe")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"new@b.com","name":"Ada"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": true,
                "message": "Confirmation email sent",
                "contact_id": "c_new",
                "email_id": "em_confirm"
            })
        );
    }

    #[tokio::test]
    async fn test_send_invalid_json_is_400() {
        let app = app(test_config("http://localhost:0", Some(SECRET), None));

        let request = Request::post("/send")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_forwards_to_provider() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "em_42"})))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(test_config(&server.uri(), Some(SECRET), None));

        let request = Request::post("/send")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"to":"x@example.com","subject":"Hi","message":"Hello"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "id": "em_42"})
        );
    }
}
