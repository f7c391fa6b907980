//! Double opt-in subscription flow.
//!
//! Subscribing creates the contact as unsubscribed (pending) and sends a
//! confirmation email; a verified `email.clicked` on that email flips the
//! contact to subscribed. `confirm` is the only path that clears the
//! `unsubscribed` flag.

use tracing::info;

use crate::error::{GatewayError, Result};
use crate::resend::{
    Contact, CreateContactRequest, ResendClient, SendEmailRequest, UpdateContactRequest,
};

/// Ids produced by a successful subscribe call.
#[derive(Debug)]
pub struct SubscribeReceipt {
    pub contact_id: String,
    pub email_id: String,
}

/// Create a pending contact and send the confirmation email.
///
/// The two provider calls are independent: if the send fails after the
/// contact was created, the pending contact stays behind unconfirmable and
/// the error is returned as-is.
pub async fn subscribe(
    client: &ResendClient,
    audience_id: &str,
    from: &str,
    confirm_url: &str,
    email: &str,
    name: Option<&str>,
) -> Result<SubscribeReceipt> {
    let mut contact = CreateContactRequest::new(email).with_unsubscribed(true);
    if let Some(name) = name {
        contact = contact.with_first_name(name);
    }

    let created = client.create_contact(audience_id, &contact).await?;

    let confirmation = SendEmailRequest::new(from, [email], "Confirm your subscription")
        .with_html(confirmation_html(name, confirm_url));
    let sent = client.send_email(&confirmation).await?;

    info!(
        contact_id = %created.id,
        email_id = %sent.id,
        "subscription_pending"
    );

    Ok(SubscribeReceipt {
        contact_id: created.id,
        email_id: sent.id,
    })
}

/// Confirm a subscription after a verified confirmation click.
///
/// Scans the audience for the first contact whose email matches
/// `recipient_email` exactly (case-sensitive) and clears its `unsubscribed`
/// flag. Re-confirming an already-confirmed contact repeats the no-op
/// update and succeeds.
pub async fn confirm(
    client: &ResendClient,
    audience_id: &str,
    recipient_email: &str,
) -> Result<Contact> {
    let contacts = client.list_contacts(audience_id).await?;

    let contact = contacts
        .into_iter()
        .find(|c| c.email == recipient_email)
        .ok_or_else(|| GatewayError::NotFound(format!("contact not found: {recipient_email}")))?;

    client
        .update_contact(
            audience_id,
            &contact.id,
            &UpdateContactRequest::new().with_unsubscribed(false),
        )
        .await?;

    info!(
        contact_id = %contact.id,
        email = %recipient_email,
        "contact_confirmed"
    );

    Ok(Contact {
        unsubscribed: false,
        ..contact
    })
}

fn confirmation_html(name: Option<&str>, confirm_url: &str) -> String {
    let greeting = match name {
        Some(name) if !name.is_empty() => format!("Welcome, {name}!"),
        _ => "Welcome!".to_string(),
    };

    format!(
        r#"<div style="text-align: center; padding: 40px 20px; font-family: Arial, sans-serif;">
  <h1>{greeting}</h1>
  <p>Please confirm your subscription to our newsletter.</p>
  <a href="{confirm_url}" style="background-color: #18181b; color: #fff; padding: 12px 32px; border-radius: 6px; text-decoration: none; font-weight: bold; display: inline-block;">Confirm Subscription</a>
</div>"#
    )
}
