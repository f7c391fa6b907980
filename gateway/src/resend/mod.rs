//! Resend API client.
//!
//! Everything under this module is a direct mapping of the provider's REST
//! surface; no gateway semantics live here.

pub mod client;
pub mod types;

pub use client::{ResendClient, DEFAULT_BASE_URL};
pub use types::{
    Attachment, Contact, ContactRef, CreateContactRequest, CreateDomainRequest, Domain,
    RetrievedEmail, SendEmailRequest, SentEmail, UpdateContactRequest,
};
