//! # Message Delivery
//!
//! Posts a [`TeamsMessage`] to an incoming webhook.
//!
//! [`DeliveryClient`] owns the delivery contract: JSON serialization, a single
//! POST, 200-only success, and cancellation. The HTTP exchange itself sits
//! behind the [`WebhookTransport`] trait so tests can substitute a fake and
//! production code can share one pooled [`ReqwestTransport`] across
//! invocations.

mod transport;

pub use transport::{check_redirect, RedirectError, ReqwestTransport};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::card::TeamsMessage;
use crate::error::DeliveryError;

/// Performs the HTTP exchange for a serialized message.
///
/// Implementations must be safe to share between concurrent invocations.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST `payload` as `application/json` to `url` and report the final status.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Transport` for DNS, connect, TLS, redirect-policy
    /// or timeout failures.
    async fn post_json(&self, url: &str, payload: Vec<u8>) -> Result<StatusCode, DeliveryError>;
}

/// Settings for the production HTTP transport.
///
/// # Examples
///
/// ```
/// use teams_notifier::DeliveryConfig;
/// use std::time::Duration;
///
/// let config = DeliveryConfig::default().with_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_redirects, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Overall request timeout, including redirects
    pub timeout: Duration,
    /// Maximum length of a redirect chain, counting the original request
    pub max_redirects: usize,
    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
    /// How long an idle pooled connection is kept
    pub pool_idle_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: 3,
            pool_max_idle_per_host: 5,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("teams-notifier/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DeliveryConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the redirect chain limit.
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Sends Teams messages through a shared transport.
///
/// Cloning is cheap; clones share the same transport and connection pool.
#[derive(Clone)]
pub struct DeliveryClient {
    transport: Arc<dyn WebhookTransport>,
}

impl DeliveryClient {
    /// Create a client backed by a hardened [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Create a client around an existing transport.
    pub fn with_transport(transport: Arc<dyn WebhookTransport>) -> Self {
        Self { transport }
    }

    /// Deliver `message` to `webhook_url`.
    ///
    /// The URL is not validated here; callers check it against the allow-list
    /// first. Redirects are validated by the transport.
    ///
    /// # Errors
    ///
    /// - `DeliveryError::Serialization` - the message could not be encoded
    /// - `DeliveryError::Transport` - the request did not complete
    /// - `DeliveryError::UnexpectedStatus` - Teams answered with anything but 200
    /// - `DeliveryError::Cancelled` - `cancel` fired first
    pub async fn send(
        &self,
        webhook_url: &str,
        message: &TeamsMessage,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::to_vec(message)?;
        debug!(payload_bytes = payload.len(), "Posting Teams message");

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Teams delivery cancelled by caller");
                return Err(DeliveryError::Cancelled);
            }
            result = self.transport.post_json(webhook_url, payload) => result?,
        };

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Teams rejected message");
            return Err(DeliveryError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        debug!("Teams accepted message");
        Ok(())
    }
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("transport", &"<WebhookTransport>")
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
