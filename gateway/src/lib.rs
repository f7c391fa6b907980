//! Courier - webhook event gateway for the Resend email platform.
//!
//! This library backs the `courier-gateway` binary:
//! - `web`: axum server receiving signed webhook callbacks
//! - `dispatch`: per-event-kind routing for verified events
//! - `optin`: double opt-in subscribe/confirm flow
//! - `resend`: typed client for the provider REST API
//!
//! ## Architecture
//!
//! ```text
//! Provider webhooks → verify (HMAC + freshness) → decode → dispatch
//! Subscribe/send requests → provider client → hosted API
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod optin;
pub mod resend;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{dispatch, WebhookAck};
pub use error::{GatewayError, Result};
pub use event::{EventKind, WebhookEvent};
pub use resend::{ResendClient, SendEmailRequest};
pub use web::{router, AppState, SignatureVerifier, WebhookEnvelope};
