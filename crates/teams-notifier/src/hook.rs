//! Lifecycle hooks a release pipeline invokes the notifier for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A point in the release lifecycle.
///
/// Serialized with the kebab-case names the host uses on the wire.
///
/// # Examples
///
/// ```
/// use teams_notifier::Hook;
///
/// let hook: Hook = "post-publish".parse().unwrap();
/// assert_eq!(hook, Hook::PostPublish);
/// assert_eq!(hook.to_string(), "post-publish");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hook {
    PreInit,
    PostInit,
    PrePlan,
    PostPlan,
    PreVersion,
    PostVersion,
    PreNotes,
    PostNotes,
    PreApprove,
    PostApprove,
    PrePublish,
    PostPublish,
    OnSuccess,
    OnError,
}

impl Hook {
    /// Every hook in lifecycle order.
    pub const ALL: [Hook; 14] = [
        Hook::PreInit,
        Hook::PostInit,
        Hook::PrePlan,
        Hook::PostPlan,
        Hook::PreVersion,
        Hook::PostVersion,
        Hook::PreNotes,
        Hook::PostNotes,
        Hook::PreApprove,
        Hook::PostApprove,
        Hook::PrePublish,
        Hook::PostPublish,
        Hook::OnSuccess,
        Hook::OnError,
    ];

    /// Wire name of the hook.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::PreInit => "pre-init",
            Hook::PostInit => "post-init",
            Hook::PrePlan => "pre-plan",
            Hook::PostPlan => "post-plan",
            Hook::PreVersion => "pre-version",
            Hook::PostVersion => "post-version",
            Hook::PreNotes => "pre-notes",
            Hook::PostNotes => "post-notes",
            Hook::PreApprove => "pre-approve",
            Hook::PostApprove => "post-approve",
            Hook::PrePublish => "pre-publish",
            Hook::PostPublish => "post-publish",
            Hook::OnSuccess => "on-success",
            Hook::OnError => "on-error",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hook name that is not part of the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hook: {name}")]
pub struct UnknownHookError {
    pub name: String,
}

impl FromStr for Hook {
    type Err = UnknownHookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .iter()
            .copied()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| UnknownHookError {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
