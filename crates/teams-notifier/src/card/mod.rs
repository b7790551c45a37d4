//! # Adaptive Card Model
//!
//! Typed representation of the Teams message payload:
//!
//! ```text
//! TeamsMessage
//! └── attachments[0]: Attachment
//!     └── content: AdaptiveCard
//!         ├── body: [CardElement]      (TextBlock | ColumnSet ─ Column ─ [CardElement])
//!         ├── actions: [CardAction]
//!         └── msteams: MsTeamsMetadata (mention entities)
//! ```
//!
//! Each element kind is its own type so only the fields Teams understands for
//! that kind can be set. Serialization produces the Adaptive Card 1.2 JSON
//! schema expected by Teams incoming webhooks.

mod builder;

pub use builder::{
    build_change_summary, build_error_message, build_mention_text, build_success_message,
    build_title, prepare_changelog, release_url, title_case, CHANGELOG_MAX_CHARS,
};

use serde::Serialize;

pub const MESSAGE_TYPE: &str = "message";
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
pub const ADAPTIVE_CARD_VERSION: &str = "1.2";
pub const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";

// ============================================================================
// Envelope
// ============================================================================

/// Top-level payload posted to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamsMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub attachments: Vec<Attachment>,
}

impl TeamsMessage {
    /// Wrap a card in the single-attachment message envelope.
    pub fn from_card(card: AdaptiveCard) -> Self {
        Self {
            message_type: MESSAGE_TYPE,
            attachments: vec![Attachment {
                content_type: ADAPTIVE_CARD_CONTENT_TYPE,
                content_url: None,
                content: card,
            }],
        }
    }

    /// The card carried by the first attachment.
    pub fn card(&self) -> Option<&AdaptiveCard> {
        self.attachments.first().map(|a| &a.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    #[serde(rename = "contentType")]
    pub content_type: &'static str,
    #[serde(rename = "contentUrl", skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    pub content: AdaptiveCard,
}

/// An Adaptive Card document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AdaptiveCard")]
pub struct AdaptiveCard {
    pub version: &'static str,
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub body: Vec<CardElement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<CardAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msteams: Option<MsTeamsMetadata>,
}

impl AdaptiveCard {
    pub fn new(body: Vec<CardElement>) -> Self {
        Self {
            version: ADAPTIVE_CARD_VERSION,
            schema: ADAPTIVE_CARD_SCHEMA,
            body,
            actions: Vec::new(),
            msteams: None,
        }
    }

    /// All text blocks in display order, descending into column sets.
    pub fn text_blocks(&self) -> Vec<&TextBlock> {
        let mut blocks = Vec::new();
        for element in &self.body {
            element.collect_text_blocks(&mut blocks);
        }
        blocks
    }
}

// ============================================================================
// Body Elements
// ============================================================================

/// A body element. Columns only appear inside a [`ColumnSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CardElement {
    TextBlock(TextBlock),
    ColumnSet(ColumnSet),
}

impl CardElement {
    fn collect_text_blocks<'a>(&'a self, out: &mut Vec<&'a TextBlock>) {
        match self {
            Self::TextBlock(block) => out.push(block),
            Self::ColumnSet(set) => {
                for column in &set.columns {
                    for item in &column.items {
                        item.collect_text_blocks(out);
                    }
                }
            }
        }
    }
}

impl From<TextBlock> for CardElement {
    fn from(block: TextBlock) -> Self {
        Self::TextBlock(block)
    }
}

impl From<ColumnSet> for CardElement {
    fn from(set: ColumnSet) -> Self {
        Self::ColumnSet(set)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<FontSize>,
    #[serde(skip_serializing_if = "is_false")]
    pub wrap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TextColor>,
    #[serde(skip_serializing_if = "is_false")]
    pub separator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn weight(mut self, weight: FontWeight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn size(mut self, size: FontSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn color(mut self, color: TextColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn separator(mut self) -> Self {
        self.separator = true;
        self
    }

    pub fn spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = Some(spacing);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSet {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Column")]
pub struct Column {
    pub width: ColumnWidth,
    pub items: Vec<CardElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnWidth {
    Auto,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FontWeight {
    Lighter,
    Default,
    Bolder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FontSize {
    Small,
    Default,
    Medium,
    Large,
    ExtraLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextColor {
    Default,
    Good,
    Warning,
    Attention,
    Accent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Spacing {
    None,
    Small,
    Default,
    Medium,
    Large,
}

// ============================================================================
// Actions and Teams Metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CardAction {
    #[serde(rename = "Action.OpenUrl")]
    OpenUrl { title: String, url: String },
}

/// Teams-specific card extensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsTeamsMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MentionEntity>,
}

/// Resolves an `<at>...</at>` token in the card text to a Teams user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "mention")]
pub struct MentionEntity {
    pub text: String,
    pub mentioned: MentionedUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionedUser {
    pub id: String,
    pub name: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
