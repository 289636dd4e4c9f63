// Gateway and dashboard error types
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::dashboard::DashboardSource;

/// Failure of a single backend call made through the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    // 401 Unauthorized - already handled centrally by the time a caller sees it
    #[error("{message}")]
    Unauthorized { message: String },

    // Any other non-success status (validation, business, server errors)
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    // No response at all
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    // Successful status, unreadable body
    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid API address: {0}")]
    InvalidUrl(String),

    #[error("Stored credential cannot be sent as a bearer header")]
    MalformedCredential,
}

impl GatewayError {
    /// HTTP status carried by the error, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized { .. } => Some(401),
            GatewayError::Api { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    /// Human-readable message suitable for a transient notification
    pub fn message(&self) -> String {
        match self {
            GatewayError::Unauthorized { message } => message.clone(),
            GatewayError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Stable code for scripted consumers
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized { .. } => "UNAUTHORIZED",
            GatewayError::Api { status, .. } if status.is_client_error() => "REQUEST_REJECTED",
            GatewayError::Api { .. } => "SERVER_ERROR",
            GatewayError::Transport(_) => "NETWORK_ERROR",
            GatewayError::Decode(_) => "INVALID_RESPONSE",
            GatewayError::InvalidUrl(_) => "INVALID_URL",
            GatewayError::MalformedCredential => "MALFORMED_CREDENTIAL",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized { .. })
    }

    /// Build an error from a non-success status and its (possibly empty) body.
    ///
    /// The backend reports failures as `{ "error": "..." }`; `message` is accepted too.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .or_else(|| value.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        if status == StatusCode::UNAUTHORIZED {
            GatewayError::Unauthorized { message }
        } else {
            GatewayError::Api { status, message }
        }
    }
}

/// Failure of a dashboard activation
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Failed to load {which}: {error}")]
    Source {
        which: DashboardSource,
        #[source]
        error: GatewayError,
    },

    #[error("Dashboard activation was cancelled")]
    Cancelled,
}

impl DashboardError {
    pub fn source_error(which: DashboardSource) -> impl FnOnce(GatewayError) -> Self {
        move |error| DashboardError::Source { which, error }
    }
}
