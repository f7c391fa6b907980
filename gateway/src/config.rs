//! Configuration module for environment variable parsing.
//!
//! Configuration is loaded once at startup and passed into the gateway
//! explicitly, so tests can construct configs with distinct keys and
//! secrets per case. The API key is required up front; path-specific
//! values (webhook secret, audience id) stay optional and surface as
//! configuration errors on the requests that need them.

use std::env;

use anyhow::{Context, Result};
use url::Url;

use crate::resend::DEFAULT_BASE_URL;
use crate::web::signature::DEFAULT_MAX_AGE_SECONDS;

const DEFAULT_FROM: &str = "Acme <onboarding@resend.dev>";
const DEFAULT_CONFIRM_URL: &str = "https://example.com/confirmed";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Resend API key
    pub api_key: String,

    /// API endpoint, overridable for tests and staging
    pub base_url: String,

    /// Default sender address for outbound email
    pub from_address: String,

    /// Shared secret for webhook signature verification
    pub webhook_secret: Option<String>,

    /// Maximum age in seconds for webhook timestamps
    pub webhook_max_age: u64,

    /// Audience holding double opt-in contacts
    pub audience_id: Option<String>,

    /// Landing page linked from the confirmation email
    pub confirm_redirect_url: Url,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when `RESEND_API_KEY` is absent or `CONFIRM_REDIRECT_URL` is
    /// not a URL; everything else has a default or is optional.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("RESEND_API_KEY").context("RESEND_API_KEY must be set")?;

        let confirm_redirect_url = env::var("CONFIRM_REDIRECT_URL")
            .unwrap_or_else(|_| DEFAULT_CONFIRM_URL.to_string())
            .parse::<Url>()
            .context("CONFIRM_REDIRECT_URL must be a valid URL")?;

        Ok(Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            api_key,

            base_url: env::var("RESEND_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),

            from_address: env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string()),

            webhook_secret: env::var("RESEND_WEBHOOK_SECRET").ok(),

            webhook_max_age: env::var("WEBHOOK_MAX_AGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_AGE_SECONDS),

            audience_id: env::var("RESEND_AUDIENCE_ID").ok(),

            confirm_redirect_url,
        })
    }
}
