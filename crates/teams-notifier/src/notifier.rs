//! # Execution Orchestrator
//!
//! Routes a lifecycle hook to the right notification, honouring the per-hook
//! toggles and dry-run mode, and folds every failure into an
//! [`ExecuteResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::card::{build_error_message, build_success_message, TeamsMessage};
use crate::config::{validate_config, NotifierConfig};
use crate::delivery::{DeliveryClient, DeliveryConfig};
use crate::error::DeliveryError;
use crate::hook::Hook;
use crate::release::ReleaseContext;
use crate::validation::ValidationResponse;
use crate::webhook_url::validate_webhook_url;

const PLUGIN_NAME: &str = "teams";
const PLUGIN_DESCRIPTION: &str = "Send release notifications to Microsoft Teams";
const PLUGIN_AUTHOR: &str = "Relicta Team";

/// Static description of the notifier for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    /// Hooks that produce a notification.
    pub hooks: Vec<Hook>,
    /// JSON Schema of the accepted configuration, as a JSON string.
    pub config_schema: String,
}

/// One invocation from the release pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub hook: Hook,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub context: ReleaseContext,
    #[serde(default)]
    pub dry_run: bool,
}

impl ExecuteRequest {
    /// Create a request with no configuration and dry-run disabled.
    pub fn new(hook: Hook, context: ReleaseContext) -> Self {
        Self {
            hook,
            config: None,
            context,
            dry_run: false,
        }
    }

    /// Set the raw plugin configuration.
    pub fn config(mut self, config: Map<String, Value>) -> Self {
        self.config = Some(config);
        self
    }

    /// Enable or disable dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of an invocation.
///
/// Exactly one of `message` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
}

impl ExecuteResponse {
    /// A successful outcome with a human-readable message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            outputs: None,
        }
    }

    /// A failed outcome.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            outputs: None,
        }
    }

    /// Attach an output value.
    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Which card a hook produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notification {
    Success,
    Failure,
}

impl Notification {
    fn for_hook(hook: Hook) -> Option<Self> {
        match hook {
            Hook::PostPublish | Hook::OnSuccess => Some(Self::Success),
            Hook::OnError => Some(Self::Failure),
            Hook::PreInit
            | Hook::PostInit
            | Hook::PrePlan
            | Hook::PostPlan
            | Hook::PreVersion
            | Hook::PostVersion
            | Hook::PreNotes
            | Hook::PostNotes
            | Hook::PreApprove
            | Hook::PostApprove
            | Hook::PrePublish => None,
        }
    }

    fn enabled(self, config: &NotifierConfig) -> bool {
        match self {
            Self::Success => config.notify_on_success,
            Self::Failure => config.notify_on_error,
        }
    }

    fn build(self, config: &NotifierConfig, context: &ReleaseContext) -> TeamsMessage {
        match self {
            Self::Success => build_success_message(config, context),
            Self::Failure => build_error_message(config, context),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "error",
        }
    }

    fn disabled_message(self) -> &'static str {
        match self {
            Self::Success => "Success notification disabled",
            Self::Failure => "Error notification disabled",
        }
    }
}

/// The Teams release notifier.
///
/// Holds only the delivery client; every invocation resolves its own
/// configuration.
#[derive(Debug, Clone)]
pub struct TeamsNotifier {
    delivery: DeliveryClient,
}

impl TeamsNotifier {
    /// Create a notifier with the default hardened HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DeliveryError> {
        Ok(Self::with_delivery_client(DeliveryClient::new(
            &DeliveryConfig::default(),
        )?))
    }

    /// Create a notifier around an existing delivery client.
    pub fn with_delivery_client(delivery: DeliveryClient) -> Self {
        Self { delivery }
    }

    /// Describe the notifier to the host.
    pub fn info() -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: PLUGIN_DESCRIPTION.to_string(),
            author: PLUGIN_AUTHOR.to_string(),
            hooks: vec![Hook::PostPublish, Hook::OnSuccess, Hook::OnError],
            config_schema: config_schema().to_string(),
        }
    }

    /// Validate a raw configuration map.
    ///
    /// Falls back to `TEAMS_WEBHOOK_URL` when the map has no webhook URL.
    pub fn validate(&self, raw: Option<&Map<String, Value>>) -> ValidationResponse {
        let response = validate_config(raw);
        debug!(
            valid = response.valid,
            error_count = response.errors.len(),
            "Validated Teams configuration"
        );
        response
    }

    /// Build the message `request` would send, without sending it.
    ///
    /// Returns `None` when the hook is not handled or its notification is
    /// disabled.
    pub fn preview(&self, request: &ExecuteRequest) -> Option<TeamsMessage> {
        let config = NotifierConfig::from_raw(request.config.as_ref());
        let notification = Notification::for_hook(request.hook)?;
        if !notification.enabled(&config) {
            return None;
        }
        Some(notification.build(&config, &request.context))
    }

    /// Handle one hook invocation.
    ///
    /// Never fails: delivery and validation problems are reported through
    /// [`ExecuteResponse::failure`].
    pub async fn execute(
        &self,
        request: &ExecuteRequest,
        cancel: &CancellationToken,
    ) -> ExecuteResponse {
        let hook = request.hook;
        info!(hook = %hook, dry_run = request.dry_run, "Executing hook");

        let Some(notification) = Notification::for_hook(hook) else {
            debug!(hook = %hook, "Hook not handled");
            return ExecuteResponse::ok(format!("Hook {} not handled", hook));
        };

        let config = NotifierConfig::from_raw(request.config.as_ref());
        if !notification.enabled(&config) {
            info!(hook = %hook, kind = notification.label(), "Notification disabled");
            return ExecuteResponse::ok(notification.disabled_message());
        }

        let message = notification.build(&config, &request.context);

        if request.dry_run {
            info!(hook = %hook, kind = notification.label(), "Dry run, not sending");
            let response = ExecuteResponse::ok(format!(
                "Would send Teams {} notification",
                notification.label()
            ));
            return match notification {
                Notification::Success => {
                    response.with_output("version", request.context.version.clone())
                }
                Notification::Failure => response,
            };
        }

        match self.deliver(&config, &message, cancel).await {
            Ok(()) => {
                info!(
                    hook = %hook,
                    kind = notification.label(),
                    version = %request.context.version,
                    "Sent Teams notification"
                );
                ExecuteResponse::ok(format!("Sent Teams {} notification", notification.label()))
            }
            Err(e) => {
                warn!(
                    hook = %hook,
                    kind = notification.label(),
                    error = %e,
                    status = ?e.status(),
                    transient = e.is_transient(),
                    "Failed to send Teams notification"
                );
                ExecuteResponse::failure(format!("failed to send Teams message: {}", e))
            }
        }
    }

    async fn deliver(
        &self,
        config: &NotifierConfig,
        message: &TeamsMessage,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        validate_webhook_url(&config.webhook_url)?;
        self.delivery
            .send(&config.webhook_url, message, cancel)
            .await
    }
}

fn config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "webhook_url": {
                "type": "string",
                "description": "Teams incoming webhook URL (or use TEAMS_WEBHOOK_URL env)"
            },
            "title_template": {
                "type": "string",
                "description": "Template for card title",
                "default": "Release {{version}}"
            },
            "include_changelog": {
                "type": "boolean",
                "description": "Include changelog in message",
                "default": true
            },
            "theme_color": {
                "type": "string",
                "description": "Accent color for the card (hex without #)",
                "default": "0076D7"
            },
            "mention_users": {
                "type": "array",
                "items": { "type": "string" },
                "description": "User emails to @mention"
            },
            "notify_on_success": {
                "type": "boolean",
                "description": "Notify on success",
                "default": true
            },
            "notify_on_error": {
                "type": "boolean",
                "description": "Notify on error",
                "default": true
            }
        },
        "required": ["webhook_url"]
    })
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
