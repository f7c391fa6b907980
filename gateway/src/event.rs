//! Webhook event envelope types.
//!
//! Events are decoded from the verified payload only; the raw `type` tag is
//! kept alongside the parsed [`EventKind`] so responses can echo tags the
//! gateway does not recognize.

use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;

/// Event kinds published by the provider.
///
/// The set is open on the wire: tags outside this list parse as `Unknown`
/// and are acknowledged without invoking a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Sent,
    Delivered,
    DeliveryDelayed,
    Complained,
    Bounced,
    Opened,
    Clicked,
    Received,
    Unknown,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "email.sent" => EventKind::Sent,
            "email.delivered" => EventKind::Delivered,
            "email.delivery_delayed" => EventKind::DeliveryDelayed,
            "email.complained" => EventKind::Complained,
            "email.bounced" => EventKind::Bounced,
            "email.opened" => EventKind::Opened,
            "email.clicked" => EventKind::Clicked,
            "email.received" => EventKind::Received,
            _ => EventKind::Unknown,
        }
    }
}

/// A verified, decoded webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub data: Value,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_tag(&self.event_type)
    }

    /// First entry of the event's `to` list.
    pub fn recipient(&self) -> Result<&str, GatewayError> {
        self.data
            .get("to")
            .and_then(Value::as_array)
            .and_then(|to| to.first())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GatewayError::MalformedEvent("no recipient in webhook data".to_string())
            })
    }

    /// Provider id of the stored message, present on inbound events.
    pub fn email_id(&self) -> Option<&str> {
        self.data.get("email_id").and_then(Value::as_str)
    }
}
