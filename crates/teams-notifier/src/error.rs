//! Error types for Teams notifier operations.
//!
//! Every failure the notifier can encounter is represented here as a value.
//! None of these errors cross the invocation boundary directly: the
//! orchestrator folds them into a failed [`crate::ExecuteResponse`].

use thiserror::Error;

/// Reasons a webhook URL is refused.
///
/// Returned both when validating user configuration and when the delivery
/// transport inspects a redirect target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlValidationError {
    /// No URL was supplied.
    #[error("webhook URL is required")]
    Required,

    /// The URL could not be parsed.
    #[error("invalid URL: {message}")]
    Malformed { message: String },

    /// The URL does not use HTTPS.
    #[error("webhook URL must use HTTPS")]
    InsecureScheme { scheme: String },

    /// The host is outside the allow-listed Microsoft webhook domains.
    #[error("webhook URL must be on *.webhook.office.com or *.logic.azure.com domain")]
    DisallowedHost { host: String },
}

/// Errors raised while delivering a message to Teams.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint failed URL validation before any request was made.
    #[error("{0}")]
    InvalidEndpoint(#[from] UrlValidationError),

    /// The HTTP client could not be built from the delivery configuration.
    #[error("invalid delivery configuration: {message}")]
    Configuration { message: String },

    /// The message could not be serialized to JSON.
    #[error("failed to marshal message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network, TLS, redirect-policy or timeout failure.
    #[error("failed to send request: {message}")]
    Transport { message: String },

    /// Teams answered with something other than 200 OK.
    #[error("teams returned status {status}")]
    UnexpectedStatus { status: u16 },

    /// The caller cancelled the invocation before the response arrived.
    #[error("request cancelled")]
    Cancelled,
}

impl DeliveryError {
    /// Status code observed from Teams, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }

    /// Check if the host may reasonably retry the whole invocation.
    ///
    /// The notifier itself never retries; this is advisory for the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidEndpoint(_) => false,
            Self::Configuration { .. } => false,
            Self::Serialization(_) => false,
            Self::Transport { .. } => true,
            Self::UnexpectedStatus { status } => *status >= 500 || *status == 429,
            Self::Cancelled => false,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the webhook credential
        let err = err.without_url();
        // reqwest hides the redirect-policy message behind its own wrapper
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message = format!("{}: {}", message, cause);
            source = cause.source();
        }
        Self::Transport { message }
    }
}

/// Errors while reading a release context supplied by the host.
#[derive(Debug, Error)]
pub enum ReleaseContextError {
    /// The JSON document did not describe a release context.
    #[error("invalid release context: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
