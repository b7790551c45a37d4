//! # Release Context
//!
//! Immutable description of the release being announced, as supplied by the
//! release pipeline. All fields are optional on the wire; absent values
//! deserialize to empty strings so card building never has to fail.

use serde::{Deserialize, Serialize};

use crate::error::ReleaseContextError;

/// What happened in the release pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseContext {
    /// Version being released, e.g. `1.2.3`.
    pub version: String,
    pub previous_version: String,
    pub tag_name: String,
    /// `major`, `minor`, `patch`, ...
    pub release_type: String,
    pub repository_url: String,
    pub repository_owner: String,
    pub repository_name: String,
    pub branch: String,
    #[serde(alias = "commit_sha")]
    pub commit_id: String,
    pub changelog: String,
    pub release_notes: String,
    /// Categorized commits. `None` and an empty set render differently.
    pub changes: Option<CategorizedChanges>,
}

impl ReleaseContext {
    /// Parse a release context from the host's JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `ReleaseContextError::InvalidJson` if the document is not valid
    /// JSON or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ReleaseContextError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Commits grouped by conventional-commit category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizedChanges {
    pub features: Vec<ConventionalCommit>,
    pub fixes: Vec<ConventionalCommit>,
    pub breaking: Vec<ConventionalCommit>,
    pub performance: Vec<ConventionalCommit>,
    pub refactor: Vec<ConventionalCommit>,
    pub docs: Vec<ConventionalCommit>,
    pub other: Vec<ConventionalCommit>,
}

/// A single commit as parsed by the release pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionalCommit {
    pub hash: String,
    #[serde(rename = "type")]
    pub commit_type: String,
    pub scope: String,
    pub description: String,
    pub body: String,
    pub breaking: bool,
    pub breaking_message: String,
    pub issues: Vec<String>,
    pub author: String,
}

impl ConventionalCommit {
    /// Shorthand used in tests and fixtures.
    pub fn new(commit_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            commit_type: commit_type.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
