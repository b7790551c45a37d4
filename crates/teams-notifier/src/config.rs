//! # Notifier Configuration
//!
//! Resolves the loosely-typed plugin configuration supplied by the host into a
//! strongly-typed [`NotifierConfig`].
//!
//! Resolution order for each field:
//! 1. The value in the configuration map, if it has the expected shape
//! 2. An environment variable (webhook URL only: `TEAMS_WEBHOOK_URL`)
//! 3. The built-in default
//!
//! Unknown keys are ignored and a missing map resolves to defaults. Whether a
//! webhook URL is actually present and well-formed is checked separately by
//! [`validate_config`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::{check_theme_color, ErrorCode, ValidationBuilder, ValidationResponse};
use crate::webhook_url::validate_webhook_url;

/// Environment variable consulted when `webhook_url` is not configured.
pub const WEBHOOK_URL_ENV: &str = "TEAMS_WEBHOOK_URL";

/// Default card title; `{{version}}` is replaced with the release version.
pub const DEFAULT_TITLE_TEMPLATE: &str = "Release {{version}}";

/// Teams blue.
pub const DEFAULT_THEME_COLOR: &str = "0076D7";

/// Green.
pub const COLOR_SUCCESS: &str = "28A745";

/// Red.
pub const COLOR_ERROR: &str = "DC3545";

/// Configuration keys understood by the notifier.
pub mod keys {
    pub const WEBHOOK_URL: &str = "webhook_url";
    pub const TITLE_TEMPLATE: &str = "title_template";
    pub const INCLUDE_CHANGELOG: &str = "include_changelog";
    pub const THEME_COLOR: &str = "theme_color";
    pub const MENTION_USERS: &str = "mention_users";
    pub const NOTIFY_ON_SUCCESS: &str = "notify_on_success";
    pub const NOTIFY_ON_ERROR: &str = "notify_on_error";
}

/// Resolved plugin settings for one invocation.
///
/// The webhook URL is a credential; the `Debug` implementation redacts it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Teams incoming webhook URL. Empty when neither configured nor in the environment.
    pub webhook_url: String,
    /// Card title template.
    pub title_template: String,
    /// Include release notes in the card.
    pub include_changelog: bool,
    /// Accent color as configured (hex, optional `#`).
    pub theme_color: String,
    /// Users to @mention, usually email addresses.
    pub mention_users: Vec<String>,
    /// Send a card on successful releases.
    pub notify_on_success: bool,
    /// Send a card on failed releases.
    pub notify_on_error: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            include_changelog: true,
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            mention_users: Vec::new(),
            notify_on_success: true,
            notify_on_error: true,
        }
    }
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let webhook = if self.webhook_url.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("NotifierConfig")
            .field("webhook_url", &webhook)
            .field("title_template", &self.title_template)
            .field("include_changelog", &self.include_changelog)
            .field("theme_color", &self.theme_color)
            .field("mention_users", &self.mention_users)
            .field("notify_on_success", &self.notify_on_success)
            .field("notify_on_error", &self.notify_on_error)
            .finish()
    }
}

impl NotifierConfig {
    /// Resolve configuration using the process environment for fallbacks.
    pub fn from_raw(raw: Option<&Map<String, Value>>) -> Self {
        Self::from_raw_with_env(raw, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn from_raw_with_env<F>(raw: Option<&Map<String, Value>>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parser = ConfigParser::new(raw, env);
        let defaults = Self::default();

        Self {
            webhook_url: parser.string_or_env(keys::WEBHOOK_URL, WEBHOOK_URL_ENV, ""),
            title_template: parser.string(keys::TITLE_TEMPLATE, &defaults.title_template),
            include_changelog: parser.bool(keys::INCLUDE_CHANGELOG, defaults.include_changelog),
            theme_color: parser.string(keys::THEME_COLOR, &defaults.theme_color),
            mention_users: parser.string_list(keys::MENTION_USERS),
            notify_on_success: parser.bool(keys::NOTIFY_ON_SUCCESS, defaults.notify_on_success),
            notify_on_error: parser.bool(keys::NOTIFY_ON_ERROR, defaults.notify_on_error),
        }
    }
}

/// Validate a raw configuration map using the process environment.
pub fn validate_config(raw: Option<&Map<String, Value>>) -> ValidationResponse {
    validate_config_with_env(raw, |name| std::env::var(name).ok())
}

/// Validate a raw configuration map with an explicit environment lookup.
///
/// Checks:
/// - `webhook_url` (or `TEAMS_WEBHOOK_URL`) is present: code `required`
/// - the webhook URL passes the allow-list: code `format`
/// - `theme_color`, when given, is a 6-digit hex color: code `format`
pub fn validate_config_with_env<F>(raw: Option<&Map<String, Value>>, env: F) -> ValidationResponse
where
    F: Fn(&str) -> Option<String>,
{
    let parser = ConfigParser::new(raw, env);
    let mut builder = ValidationBuilder::new();

    let webhook = parser.string_or_env(keys::WEBHOOK_URL, WEBHOOK_URL_ENV, "");
    if webhook.is_empty() {
        builder.add_error(
            keys::WEBHOOK_URL,
            format!(
                "Teams webhook URL is required (set {} env var or configure {})",
                WEBHOOK_URL_ENV,
                keys::WEBHOOK_URL
            ),
            ErrorCode::Required,
        );
    } else if let Err(e) = validate_webhook_url(&webhook) {
        builder.add_error(keys::WEBHOOK_URL, e.to_string(), ErrorCode::Format);
    }

    let theme_color = parser.string(keys::THEME_COLOR, "");
    if !theme_color.is_empty() {
        if let Err(message) = check_theme_color(&theme_color) {
            builder.add_error(keys::THEME_COLOR, message, ErrorCode::Format);
        }
    }

    builder.build()
}

// ============================================================================
// Raw Map Access
// ============================================================================

/// Typed accessors over an optional JSON object.
///
/// Values of an unexpected shape are treated as absent.
struct ConfigParser<'a, F> {
    raw: Option<&'a Map<String, Value>>,
    env: F,
}

impl<'a, F> ConfigParser<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(raw: Option<&'a Map<String, Value>>, env: F) -> Self {
        Self { raw, env }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.raw.and_then(|map| map.get(key))
    }

    /// Non-empty string value for `key`, or `default`.
    fn string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Like [`Self::string`] but consults `env_name` before the default.
    fn string_or_env(&self, key: &str, env_name: &str, default: &str) -> String {
        if let Some(Value::String(s)) = self.get(key) {
            if !s.is_empty() {
                return s.clone();
            }
        }

        match (self.env)(env_name) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    /// Native bool or `"true"`/`"false"` (case-insensitive), otherwise `default`.
    fn bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Array of strings or a comma-separated string. Blank entries are dropped.
    fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
