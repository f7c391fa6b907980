//! Gateway error taxonomy and HTTP status mapping.
//!
//! Every request-level failure is converted into one `GatewayError` variant;
//! the `IntoResponse` impl is the single place where errors become status
//! codes, so handlers never map statuses by hand.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::web::signature::VerifyError;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required secret or identifier is absent from the configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request body could not be parsed.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Signature or timestamp verification failed; nothing was processed.
    #[error("webhook verification failed: {0}")]
    Verification(#[from] VerifyError),

    /// The verified payload lacks a field the handler requires.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// A referenced contact or domain does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider API call itself failed (network, rate limit, rejection).
    #[error("provider request failed: {message}")]
    Provider { status: Option<u16>, message: String },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Verification(_) => StatusCode::BAD_REQUEST,
            GatewayError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Provider {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            // Verification failures get their own event name so security
            // monitoring can alert on them separately from ordinary 4xx noise.
            GatewayError::Verification(reason) => {
                warn!(reason = %reason, "webhook_verification_rejected");
            }
            GatewayError::Provider { status, message } => {
                error!(provider_status = ?status, message = %message, "provider_request_failed");
            }
            GatewayError::Configuration(message) => {
                error!(message = %message, "configuration_error");
            }
            other => {
                warn!(error = %other, "request_rejected");
            }
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
