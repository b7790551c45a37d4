//! Card construction for success and failure notifications.
//!
//! Everything here is a pure function of the configuration and release
//! context: no I/O, no clock, no randomness.

use crate::config::{NotifierConfig, DEFAULT_TITLE_TEMPLATE};
use crate::release::{CategorizedChanges, ReleaseContext};

use super::{
    AdaptiveCard, CardAction, CardElement, Column, ColumnSet, ColumnWidth, FontSize, FontWeight,
    MentionEntity, MentionedUser, MsTeamsMetadata, Spacing, TeamsMessage, TextBlock, TextColor,
};

/// Release notes longer than this many characters are truncated.
pub const CHANGELOG_MAX_CHARS: usize = 2000;

const VERSION_PLACEHOLDER: &str = "{{version}}";
const ELLIPSIS: &str = "...";

// ============================================================================
// Message Builders
// ============================================================================

/// Build the card announcing a successful release.
///
/// Body order: title, metadata grid, change summary, changelog, mentions.
/// A "View Release" action is attached when the repository and tag are known.
pub fn build_success_message(config: &NotifierConfig, context: &ReleaseContext) -> TeamsMessage {
    let mut body: Vec<CardElement> = vec![
        TextBlock::new(build_title(&config.title_template, &context.version))
            .weight(FontWeight::Bolder)
            .size(FontSize::Large)
            .color(TextColor::Good)
            .into(),
        metadata_grid(&[
            ("Version", context.version.clone()),
            ("Type", title_case(&context.release_type)),
            ("Branch", context.branch.clone()),
            ("Tag", context.tag_name.clone()),
        ]),
    ];

    if let Some(summary) = build_change_summary(context.changes.as_ref()) {
        body.push(
            TextBlock::new(format!("Changes: {}", summary))
                .separator()
                .spacing(Spacing::Medium)
                .into(),
        );
    }

    if config.include_changelog && !context.release_notes.is_empty() {
        body.push(
            TextBlock::new(prepare_changelog(&context.release_notes))
                .wrap()
                .separator()
                .spacing(Spacing::Medium)
                .into(),
        );
    }

    push_mentions(&mut body, &config.mention_users);

    let mut card = AdaptiveCard::new(body);
    if let Some(url) = release_url(&context.repository_url, &context.tag_name) {
        card.actions.push(CardAction::OpenUrl {
            title: "View Release".to_string(),
            url,
        });
    }
    card.msteams = mention_metadata(&config.mention_users);

    TeamsMessage::from_card(card)
}

/// Build the card announcing a failed release.
///
/// Only the title, a version/branch grid and mentions are included.
pub fn build_error_message(config: &NotifierConfig, context: &ReleaseContext) -> TeamsMessage {
    let mut body: Vec<CardElement> = vec![
        TextBlock::new(format!("Release {} Failed", context.version))
            .weight(FontWeight::Bolder)
            .size(FontSize::Large)
            .color(TextColor::Attention)
            .into(),
        metadata_grid(&[
            ("Version", context.version.clone()),
            ("Branch", context.branch.clone()),
        ]),
    ];

    push_mentions(&mut body, &config.mention_users);

    let mut card = AdaptiveCard::new(body);
    card.msteams = mention_metadata(&config.mention_users);

    TeamsMessage::from_card(card)
}

// ============================================================================
// Text Helpers
// ============================================================================

/// Replace every `{{version}}` in `template` with `version`.
///
/// An empty template falls back to `"Release {{version}}"`.
pub fn build_title(template: &str, version: &str) -> String {
    let template = if template.is_empty() {
        DEFAULT_TITLE_TEMPLATE
    } else {
        template
    };
    template.replace(VERSION_PLACEHOLDER, version)
}

/// `"<features> features, <fixes> fixes"` plus an emphasized breaking count.
///
/// Returns `None` when the release carries no change list at all. An empty
/// change list still yields `"0 features, 0 fixes"`.
pub fn build_change_summary(changes: Option<&CategorizedChanges>) -> Option<String> {
    let changes = changes?;

    let mut summary = format!(
        "{} features, {} fixes",
        changes.features.len(),
        changes.fixes.len()
    );
    if !changes.breaking.is_empty() {
        summary.push_str(&format!(", **{} breaking changes**", changes.breaking.len()));
    }

    Some(summary)
}

/// Truncate release notes to [`CHANGELOG_MAX_CHARS`] and HTML-escape them.
///
/// Truncation counts characters of the raw notes; escaping happens afterwards,
/// so entities never get cut in half and the escaped text may be longer.
pub fn prepare_changelog(notes: &str) -> String {
    let truncated = match notes.char_indices().nth(CHANGELOG_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &notes[..cut], ELLIPSIS),
        None => notes.to_string(),
    };
    escape_html(&truncated)
}

/// `"cc: <at>a</at> <at>b</at>"`, or an empty string when nobody is mentioned.
pub fn build_mention_text(users: &[String]) -> String {
    if users.is_empty() {
        return String::new();
    }

    let mentions: Vec<String> = users.iter().map(|user| mention_token(user)).collect();
    format!("cc: {}", mentions.join(" "))
}

/// `<repo>/releases/tag/<tag>` with any trailing `.git` removed from the repo.
pub fn release_url(repository_url: &str, tag_name: &str) -> Option<String> {
    if repository_url.is_empty() || tag_name.is_empty() {
        return None;
    }

    let repo = repository_url
        .strip_suffix(".git")
        .unwrap_or(repository_url);
    Some(format!("{}/releases/tag/{}", repo, tag_name))
}

/// Upper-case the first letter of each word and lower-case the rest.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;

    for c in value.chars() {
        if at_word_start {
            result.extend(c.to_uppercase());
        } else {
            result.extend(c.to_lowercase());
        }
        at_word_start = !c.is_alphanumeric();
    }

    result
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn mention_token(user: &str) -> String {
    format!("<at>{}</at>", user)
}

// ============================================================================
// Element Helpers
// ============================================================================

/// Two-column label/value grid.
fn metadata_grid(rows: &[(&str, String)]) -> CardElement {
    let labels: Vec<CardElement> = rows
        .iter()
        .map(|(label, _)| {
            TextBlock::new(format!("{}:", label))
                .weight(FontWeight::Bolder)
                .into()
        })
        .collect();
    let values: Vec<CardElement> = rows
        .iter()
        .map(|(_, value)| TextBlock::new(value.clone()).into())
        .collect();

    ColumnSet {
        columns: vec![
            Column {
                width: ColumnWidth::Auto,
                items: labels,
            },
            Column {
                width: ColumnWidth::Stretch,
                items: values,
            },
        ],
    }
    .into()
}

fn push_mentions(body: &mut Vec<CardElement>, users: &[String]) {
    if users.is_empty() {
        return;
    }
    body.push(
        TextBlock::new(build_mention_text(users))
            .spacing(Spacing::Medium)
            .into(),
    );
}

fn mention_metadata(users: &[String]) -> Option<MsTeamsMetadata> {
    if users.is_empty() {
        return None;
    }

    let entities = users
        .iter()
        .map(|user| MentionEntity {
            text: mention_token(user),
            mentioned: MentionedUser {
                id: user.clone(),
                name: user.clone(),
            },
        })
        .collect();

    Some(MsTeamsMetadata {
        width: Some("Full".to_string()),
        entities,
    })
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
