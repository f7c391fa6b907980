//! Event dispatch.
//!
//! Routes a verified event to its handler based on kind alone; the gateway
//! keeps no state between deliveries. Kinds without a handler, including
//! ones this build has never heard of, are acknowledged untouched so new
//! provider event types never break the endpoint.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::event::{EventKind, WebhookEvent};
use crate::resend::ResendClient;

/// Acknowledgement returned for every verified delivery.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,

    #[serde(rename = "type")]
    pub event_type: String,
}

impl WebhookAck {
    fn of(event: &WebhookEvent) -> Self {
        Self {
            received: true,
            event_type: event.event_type.clone(),
        }
    }
}

/// Route a verified event to its handler.
pub async fn dispatch(client: &ResendClient, event: &WebhookEvent) -> WebhookAck {
    match event.kind() {
        EventKind::Received => handle_inbound(client, event).await,

        EventKind::Delivered => {
            info!(event_type = %event.event_type, "email_delivered");
        }

        EventKind::Bounced => {
            warn!(event_type = %event.event_type, "email_bounced");
        }

        EventKind::Clicked => {
            // Record-only here; the double opt-in endpoint routes clicks
            // into the confirmation transition itself.
            info!(event_type = %event.event_type, "email_clicked");
        }

        EventKind::Sent
        | EventKind::Opened
        | EventKind::Complained
        | EventKind::DeliveryDelayed => {
            info!(event_type = %event.event_type, "email_event_recorded");
        }

        EventKind::Unknown => {
            info!(event_type = %event.event_type, "email_event_unhandled");
        }
    }

    WebhookAck::of(event)
}

/// Read-through fetch of an inbound message's full content.
///
/// A fetch failure is a provider-side fault and gets provider-error logging;
/// the delivery itself is still acknowledged.
async fn handle_inbound(client: &ResendClient, event: &WebhookEvent) {
    let Some(email_id) = event.email_id() else {
        error!(event_type = %event.event_type, "inbound_event_missing_email_id");
        return;
    };

    match client.get_email(email_id).await {
        Ok(email) => {
            info!(
                email_id = %email_id,
                from = %email.from,
                subject = %email.subject,
                has_text = email.text.is_some(),
                has_html = email.html.is_some(),
                "inbound_email_fetched"
            );
        }
        Err(e) => {
            error!(email_id = %email_id, error = %e, "inbound_email_fetch_failed");
        }
    }
}
