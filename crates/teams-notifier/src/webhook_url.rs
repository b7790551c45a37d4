//! # Webhook URL Validation
//!
//! Decides whether a URL is a safe destination for release data.
//!
//! Teams incoming webhooks embed their credential in the URL itself, so a
//! misconfigured or redirected URL could leak both the credential and the
//! release contents to an arbitrary host. Only HTTPS URLs whose host ends in
//! one of the Microsoft webhook domains are accepted.
//!
//! The same predicate is applied to every redirect hop by the delivery
//! transport.

use url::Url;

use crate::error::UrlValidationError;

/// Hostname suffixes Teams webhooks are served from.
///
/// The leading dot is significant: `webhook.office.com.evil.com` must not match.
pub const ALLOWED_HOST_SUFFIXES: &[&str] = &[".webhook.office.com", ".logic.azure.com"];

const REQUIRED_SCHEME: &str = "https";

/// Check whether a `host[:port]` string belongs to an allow-listed domain.
///
/// A trailing `:port` is stripped before matching unless the host is a
/// bracketed IPv6 literal, which never matches anyway.
pub fn is_allowed_host(host: &str) -> bool {
    let hostname = match host.rfind(':') {
        Some(idx) if !host.contains('[') => &host[..idx],
        _ => host,
    };

    ALLOWED_HOST_SUFFIXES
        .iter()
        .any(|suffix| hostname.ends_with(suffix))
}

/// Check whether a parsed URL may receive webhook traffic.
pub fn is_allowed_url(url: &Url) -> bool {
    check_url(url).is_ok()
}

/// Validate a raw webhook URL string.
///
/// # Errors
///
/// - `UrlValidationError::Required` - empty input
/// - `UrlValidationError::Malformed` - not a parseable absolute URL
/// - `UrlValidationError::InsecureScheme` - scheme other than `https`
/// - `UrlValidationError::DisallowedHost` - host outside the allow-list
pub fn validate_webhook_url(raw: &str) -> Result<Url, UrlValidationError> {
    if raw.is_empty() {
        return Err(UrlValidationError::Required);
    }

    let url = Url::parse(raw).map_err(|e| UrlValidationError::Malformed {
        message: e.to_string(),
    })?;

    check_url(&url)?;
    Ok(url)
}

/// Apply the scheme and host rules to an already-parsed URL.
pub(crate) fn check_url(url: &Url) -> Result<(), UrlValidationError> {
    if url.scheme() != REQUIRED_SCHEME {
        return Err(UrlValidationError::InsecureScheme {
            scheme: url.scheme().to_string(),
        });
    }

    // `Url` drops default ports, so `host_str` alone is the hostname
    let host = url.host_str().unwrap_or_default();
    if !is_allowed_host(host) {
        return Err(UrlValidationError::DisallowedHost {
            host: host.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "webhook_url_tests.rs"]
mod tests;
