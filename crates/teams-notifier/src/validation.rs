//! # Configuration Validation
//!
//! Structured validation results returned to the host.
//!
//! Validation never fails with an error value of its own. Problems with the
//! configuration are collected as [`FieldError`]s so the host can show all of
//! them at once.

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A mandatory field is missing.
    Required,
    /// A field is present but malformed.
    Format,
}

impl ErrorCode {
    /// Wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Format => "format",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem with one configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
}

/// Outcome of validating a plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ValidationResponse {
    /// Check whether any error was reported for `field`.
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Errors reported for `field`, in the order they were found.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }
}

/// Accumulates field errors and produces a [`ValidationResponse`].
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<FieldError>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against a field.
    pub fn add_error(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
        code: ErrorCode,
    ) -> &mut Self {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
            code,
        });
        self
    }

    pub fn build(self) -> ValidationResponse {
        ValidationResponse {
            valid: self.errors.is_empty(),
            errors: self.errors,
        }
    }
}

/// Check a theme color: six hex digits, optionally prefixed with `#`.
///
/// Returns the message to report when the color is rejected.
pub fn check_theme_color(color: &str) -> Result<(), &'static str> {
    let hex = color.strip_prefix('#').unwrap_or(color);

    // Count chars, not bytes, so a multibyte character is reported as non-hex
    if hex.chars().count() != 6 {
        return Err("theme_color must be a 6-character hex color (e.g., '0076D7')");
    }

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("theme_color must contain only hexadecimal characters");
    }

    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
