//! # Teams Notifier
//!
//! Release notifications for Microsoft Teams incoming webhooks.
//!
//! Given a release event from a release-automation pipeline, this crate builds an
//! Adaptive Card describing the release and delivers it to a Teams webhook.
//!
//! The crate provides:
//! - Configuration resolution from a loosely-typed map with environment fallback
//! - Webhook URL allow-listing (HTTPS only, Microsoft webhook domains only)
//! - Pure Adaptive Card construction for success and failure notifications
//! - Hardened HTTP delivery (TLS 1.3 floor, timeouts, validated redirects)
//! - Hook routing with per-hook toggles and dry-run support
//!
//! ## Architecture
//!
//! The notifier is stateless per invocation. The only shared resource is the
//! pooled HTTP transport, which is constructed once and injected through
//! [`DeliveryClient`]. Tests substitute their own [`WebhookTransport`].
//!
//! # Examples
//!
//! ```rust
//! use teams_notifier::card::build_title;
//!
//! assert_eq!(build_title("", "1.2.3"), "Release 1.2.3");
//! assert_eq!(build_title("Shipped {{version}}!", "2.0.0"), "Shipped 2.0.0!");
//! ```
//!
//! ```rust,no_run
//! use teams_notifier::{ExecuteRequest, Hook, ReleaseContext, TeamsNotifier};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = TeamsNotifier::new()?;
//! let request = ExecuteRequest::new(Hook::PostPublish, ReleaseContext::default()).dry_run(true);
//! let response = notifier.execute(&request, &CancellationToken::new()).await;
//! assert!(response.success);
//! # Ok(())
//! # }
//! ```

pub mod card;
pub mod config;
pub mod delivery;
pub mod error;
pub mod hook;
pub mod notifier;
pub mod release;
pub mod validation;
pub mod webhook_url;

pub use config::NotifierConfig;
pub use delivery::{DeliveryClient, DeliveryConfig, ReqwestTransport, WebhookTransport};
pub use error::{DeliveryError, ReleaseContextError, UrlValidationError};
pub use hook::Hook;
pub use notifier::{ExecuteRequest, ExecuteResponse, PluginInfo, TeamsNotifier};
pub use release::{CategorizedChanges, ConventionalCommit, ReleaseContext};
pub use validation::{ErrorCode, FieldError, ValidationResponse};
