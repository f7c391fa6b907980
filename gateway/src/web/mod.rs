//! Web server module for the gateway's HTTP surface.
//!
//! - `/webhook` and `/double-optin/webhook` receive signed provider
//!   callbacks; verification runs before anything touches the payload.
//! - `/send` and `/double-optin/subscribe` are thin fronts over the
//!   provider client.

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};

pub use handlers::{
    double_optin_subscribe, double_optin_webhook, health, send, webhook, AppState, ConfirmAck,
    HealthResponse, SendRequest, SendResponse, SubscribeRequest, SubscribeResponse,
};
pub use signature::{SignatureVerifier, VerifyError, WebhookEnvelope, DEFAULT_MAX_AGE_SECONDS};

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/send", post(send))
        .route("/webhook", post(webhook))
        .route("/double-optin/subscribe", post(double_optin_subscribe))
        .route("/double-optin/webhook", post(double_optin_webhook))
        .with_state(state)
}
