//! Request and response types for the Resend REST API.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

// =============================================================================
// Emails
// =============================================================================

/// Outbound email for `POST /emails`.
#[derive(Debug, Clone, Serialize)]
pub struct SendEmailRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// ISO 8601 delivery time, passed through verbatim. The provider caps
    /// scheduling at 7 days out and enforces that cap itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,

    /// Custom SMTP headers, e.g. `X-Entity-Ref-ID` to keep Gmail from
    /// threading similar messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl SendEmailRequest {
    pub fn new(
        from: impl Into<String>,
        to: impl IntoIterator<Item = impl Into<String>>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            html: None,
            text: None,
            scheduled_at: None,
            headers: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_scheduled_at(mut self, scheduled_at: impl Into<String>) -> Self {
        self.scheduled_at = Some(scheduled_at.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// File attachment; `content` is base64 per the API contract.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// CID for inline images referenced as `cid:<id>` in the HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

impl Attachment {
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content: BASE64.encode(bytes),
            content_type: None,
            content_id: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn inline(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }
}

/// `POST /emails` and `POST /emails/{id}/cancel` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SentEmail {
    pub id: String,
}

/// `POST /emails/batch` response.
#[derive(Debug, Deserialize)]
pub struct BatchResponse {
    pub data: Vec<SentEmail>,
}

/// Full stored message from `GET /emails/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedEmail {
    pub id: String,

    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub html: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub last_event: Option<String>,
}

// =============================================================================
// Contacts
// =============================================================================

/// Audience member as returned by `GET /audiences/{id}/contacts`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Contact {
    pub id: String,
    pub email: String,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub unsubscribed: bool,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET /audiences/{id}/contacts` response.
#[derive(Debug, Deserialize)]
pub struct ContactList {
    pub data: Vec<Contact>,
}

/// Body for `POST /audiences/{id}/contacts`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateContactRequest {
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    pub unsubscribed: bool,
}

impl CreateContactRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
            unsubscribed: false,
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_unsubscribed(mut self, unsubscribed: bool) -> Self {
        self.unsubscribed = unsubscribed;
        self
    }
}

/// Body for `PATCH /audiences/{id}/contacts/{contact_id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateContactRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

impl UpdateContactRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unsubscribed(mut self, unsubscribed: bool) -> Self {
        self.unsubscribed = Some(unsubscribed);
        self
    }
}

/// Reference returned by contact create/update calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRef {
    pub id: String,
}

// =============================================================================
// Domains
// =============================================================================

/// Sending domain as returned by the domains endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET /domains` response.
#[derive(Debug, Deserialize)]
pub struct DomainList {
    pub data: Vec<Domain>,
}

/// Body for `POST /domains`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDomainRequest {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl CreateDomainRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
        }
    }
}

/// Error body the API returns on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}
