//! Typed client for the Resend REST API.
//!
//! A thin pass-through over the hosted API: every method is one HTTP call
//! with bearer-token auth and JSON bodies. The gateway does not retry
//! failures; callers decide their own retry policy.

use std::time::Duration;

use futures::future::join_all;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{GatewayError, Result};

use super::types::{
    ApiErrorBody, BatchResponse, Contact, ContactList, ContactRef, CreateContactRequest,
    CreateDomainRequest, Domain, DomainList, RetrievedEmail, SendEmailRequest, SentEmail,
    UpdateContactRequest,
};

/// Hosted API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shareable handle to the Resend API.
#[derive(Debug, Clone)]
pub struct ResendClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ResendClient {
    /// Create a client against a specific API endpoint.
    ///
    /// `base_url` is explicit so tests can point the client at a local stub.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    /// Decode a response, mapping non-2xx statuses to `ProviderError` with
    /// the API's own error message when one is present.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(GatewayError::from);
        }

        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body
                .message
                .or(body.name)
                .unwrap_or_else(|| format!("API returned {status}")),
            Err(_) => format!("API returned {status}"),
        };

        Err(GatewayError::Provider {
            status: Some(status.as_u16()),
            message,
        })
    }

    // =========================================================================
    // Emails
    // =========================================================================

    /// Send one email. `POST /emails`.
    pub async fn send_email(&self, email: &SendEmailRequest) -> Result<SentEmail> {
        let response = self
            .request(Method::POST, "/emails")
            .json(email)
            .send()
            .await?;

        let sent: SentEmail = Self::decode(response).await?;
        info!(email_id = %sent.id, subject = %email.subject, "email_sent");
        Ok(sent)
    }

    /// Send up to 100 emails in one call. `POST /emails/batch`.
    ///
    /// The provider enforces the batch limits (no attachments, no
    /// scheduling); a violation fails the entire batch.
    pub async fn send_batch(&self, emails: &[SendEmailRequest]) -> Result<Vec<SentEmail>> {
        let response = self
            .request(Method::POST, "/emails/batch")
            .json(emails)
            .send()
            .await?;

        let batch: BatchResponse = Self::decode(response).await?;
        info!(count = batch.data.len(), "batch_sent");
        Ok(batch.data)
    }

    /// Dispatch independent sends concurrently, one result per email.
    ///
    /// Unlike `send_batch` this issues separate API calls, so one failure
    /// does not affect the others and per-email features stay available.
    pub async fn send_all(&self, emails: &[SendEmailRequest]) -> Vec<Result<SentEmail>> {
        join_all(emails.iter().map(|email| self.send_email(email))).await
    }

    /// Fetch a stored message, e.g. one announced by an inbound event.
    /// `GET /emails/{id}`.
    pub async fn get_email(&self, email_id: &str) -> Result<RetrievedEmail> {
        let response = self
            .request(Method::GET, &format!("/emails/{email_id}"))
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Cancel a scheduled send. `POST /emails/{id}/cancel`.
    pub async fn cancel_email(&self, email_id: &str) -> Result<SentEmail> {
        let response = self
            .request(Method::POST, &format!("/emails/{email_id}/cancel"))
            .send()
            .await?;

        let cancelled: SentEmail = Self::decode(response).await?;
        info!(email_id = %cancelled.id, "scheduled_email_cancelled");
        Ok(cancelled)
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// List every contact in an audience. `GET /audiences/{id}/contacts`.
    pub async fn list_contacts(&self, audience_id: &str) -> Result<Vec<Contact>> {
        let response = self
            .request(Method::GET, &format!("/audiences/{audience_id}/contacts"))
            .send()
            .await?;

        let list: ContactList = Self::decode(response).await?;
        Ok(list.data)
    }

    /// Add a contact to an audience. `POST /audiences/{id}/contacts`.
    pub async fn create_contact(
        &self,
        audience_id: &str,
        contact: &CreateContactRequest,
    ) -> Result<ContactRef> {
        let response = self
            .request(Method::POST, &format!("/audiences/{audience_id}/contacts"))
            .json(contact)
            .send()
            .await?;

        let created: ContactRef = Self::decode(response).await?;
        info!(contact_id = %created.id, email = %contact.email, "contact_created");
        Ok(created)
    }

    /// Patch a contact. `PATCH /audiences/{id}/contacts/{contact_id}`.
    pub async fn update_contact(
        &self,
        audience_id: &str,
        contact_id: &str,
        patch: &UpdateContactRequest,
    ) -> Result<ContactRef> {
        let response = self
            .request(
                Method::PATCH,
                &format!("/audiences/{audience_id}/contacts/{contact_id}"),
            )
            .json(patch)
            .send()
            .await?;

        let updated: ContactRef = Self::decode(response).await?;
        info!(contact_id = %updated.id, "contact_updated");
        Ok(updated)
    }

    // =========================================================================
    // Domains
    // =========================================================================

    /// List sending domains. `GET /domains`.
    pub async fn list_domains(&self) -> Result<Vec<Domain>> {
        let response = self.request(Method::GET, "/domains").send().await?;

        let list: DomainList = Self::decode(response).await?;
        Ok(list.data)
    }

    /// Register a sending domain. `POST /domains`.
    pub async fn create_domain(&self, domain: &CreateDomainRequest) -> Result<Domain> {
        let response = self
            .request(Method::POST, "/domains")
            .json(domain)
            .send()
            .await?;

        let created: Domain = Self::decode(response).await?;
        info!(domain_id = %created.id, name = %created.name, "domain_created");
        Ok(created)
    }
}
