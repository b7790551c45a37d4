//! Hardened reqwest transport.
//!
//! - rustls with TLS 1.3 as the minimum protocol version
//! - a bounded overall timeout
//! - pooled connections reused across invocations
//! - every redirect hop re-checked against the webhook allow-list
//!
//! TLS settings live on the client, so they apply to redirect hops as well.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::{Attempt, Policy};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use super::{DeliveryConfig, WebhookTransport};
use crate::error::{DeliveryError, UrlValidationError};
use crate::webhook_url::check_url;

/// Why a redirect was not followed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },

    #[error("redirect to non-HTTPS URL not allowed")]
    InsecureScheme,

    #[error("redirect away from Microsoft domains not allowed")]
    DisallowedHost,
}

/// Decide whether a redirect to `target` may be followed.
///
/// `previous_hops` is the number of URLs already requested in the chain,
/// including the original request.
pub fn check_redirect(target: &Url, previous_hops: usize, limit: usize) -> Result<(), RedirectError> {
    check_redirect_with(target, previous_hops, limit, check_url)
}

/// Destination rule applied to each redirect hop.
type DestinationCheck = fn(&Url) -> Result<(), UrlValidationError>;

fn check_redirect_with(
    target: &Url,
    previous_hops: usize,
    limit: usize,
    check_destination: DestinationCheck,
) -> Result<(), RedirectError> {
    if previous_hops >= limit {
        return Err(RedirectError::TooManyRedirects { limit });
    }

    match check_destination(target) {
        Ok(()) => Ok(()),
        Err(UrlValidationError::InsecureScheme { .. }) => Err(RedirectError::InsecureScheme),
        Err(_) => Err(RedirectError::DisallowedHost),
    }
}

fn redirect_policy(limit: usize) -> Policy {
    redirect_policy_with(limit, check_url)
}

fn redirect_policy_with(limit: usize, check_destination: DestinationCheck) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        match check_redirect_with(
            attempt.url(),
            attempt.previous().len(),
            limit,
            check_destination,
        ) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                tracing::warn!(error = %e, "Refusing webhook redirect");
                attempt.error(e)
            }
        }
    })
}

/// Production [`WebhookTransport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a hardened client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the TLS backend rejects the settings.
    pub fn new(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_3)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(redirect_policy(config.max_redirects))
            .build()
            .map_err(|e| DeliveryError::Configuration {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, payload: Vec<u8>) -> Result<StatusCode, DeliveryError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        Ok(response.status())
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
