// src/render/mod.rs
//! Turn selected candidates into platform message objects.
//!
//! All formats share the same filter/selector upstream; only the shape of
//! the outgoing objects differs. Every object remembers which item ids it
//! carries so the dispatcher can report exactly what was delivered.

pub mod embed;
pub mod flex;
pub mod text;

use serde::Deserialize;
use std::fmt;

use crate::config::{NotifierConfig, Platform};
use crate::filter::Candidate;

/// Display label for a candidate without a brand match.
pub const UNKNOWN_BRAND_LABEL: &str = "（不明）";
/// Shown in place of an empty feed title; LINE rejects empty text components.
pub const UNTITLED: &str = "(無題)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "flex")]
    Flex,
    #[serde(rename = "text", alias = "plaintext")]
    PlainText,
    #[serde(rename = "embed")]
    Embed,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flex" => Some(OutputFormat::Flex),
            "text" | "plaintext" => Some(OutputFormat::PlainText),
            "embed" => Some(OutputFormat::Embed),
            _ => None,
        }
    }

    pub fn supported_on(self, platform: Platform) -> bool {
        matches!(
            (self, platform),
            (OutputFormat::PlainText, _)
                | (OutputFormat::Flex, Platform::Line)
                | (OutputFormat::Embed, Platform::Discord)
        )
    }

    /// Whether this format shows a preview image, i.e. thumbnails are worth fetching.
    pub fn uses_images(self) -> bool {
        matches!(self, OutputFormat::Flex | OutputFormat::Embed)
    }

    pub fn render(self, items: &[RenderItem], cfg: &NotifierConfig) -> Vec<OutboundMessage> {
        match self {
            OutputFormat::PlainText => text::render(items, cfg),
            OutputFormat::Flex => items.iter().map(|it| flex::render(it, cfg)).collect(),
            OutputFormat::Embed => items.iter().map(|it| embed::render(it, cfg)).collect(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Flex => f.write_str("flex"),
            OutputFormat::PlainText => f.write_str("text"),
            OutputFormat::Embed => f.write_str("embed"),
        }
    }
}

/// A selected candidate plus its resolved preview image.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub candidate: Candidate,
    pub thumbnail: Option<String>,
}

impl RenderItem {
    pub fn new(candidate: Candidate) -> Self {
        Self {
            candidate,
            thumbnail: None,
        }
    }

    pub fn brand_label(&self) -> &str {
        if self.candidate.has_brand() {
            &self.candidate.category
        } else {
            UNKNOWN_BRAND_LABEL
        }
    }

    pub fn title(&self) -> &str {
        let title = self.candidate.item.title.as_str();
        if title.trim().is_empty() {
            UNTITLED
        } else {
            title
        }
    }
}

/// Platform-neutral message content; sinks encode it to their wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text { text: String },
    Flex {
        alt_text: String,
        contents: serde_json::Value,
    },
    Embed { embed: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub body: MessageBody,
    pub item_ids: Vec<String>,
}

/// Collapse whitespace and cut to `n` chars, ending with `…` when cut.
pub fn short(text: &str, n: usize) -> String {
    let t = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if t.chars().count() > n {
        let mut cut: String = t.chars().take(n.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        t
    }
}
