// src/render/embed.rs
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{short, MessageBody, OutboundMessage, RenderItem};
use crate::config::NotifierConfig;

const DEFAULT_COLOR: u32 = 0x2D9CDB;
const TITLE_MAX: usize = 256;
const DESCRIPTION_MAX: usize = 260;

/// Feed dates come as RFC 2822 (RSS) or RFC 3339 (Atom, dc:date).
fn iso_timestamp(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
}

/// One Discord embed per candidate.
pub fn render(it: &RenderItem, cfg: &NotifierConfig) -> OutboundMessage {
    let c = &it.candidate;

    let mut color = cfg.brand_color(&c.category).unwrap_or(DEFAULT_COLOR);
    if c.is_priority {
        color = cfg.priority.color.unwrap_or(color);
    }

    let title = if c.is_priority {
        format!("🔥 {}速報： {}", cfg.priority.label, it.title())
    } else {
        it.title().to_string()
    };

    let mut embed = json!({
        "title": short(&title, TITLE_MAX),
        "url": c.item.link,
        "description": short(&c.item.summary, DESCRIPTION_MAX),
        "color": color,
        "fields": [
            { "name": "ブランド", "value": it.brand_label(), "inline": true },
        ],
    });
    if let Some(img) = &it.thumbnail {
        embed["image"] = json!({ "url": img });
    }
    if let Some(ts) = c.item.published.as_deref().and_then(iso_timestamp) {
        embed["timestamp"] = Value::String(ts);
    }

    OutboundMessage {
        body: MessageBody::Embed { embed },
        item_ids: vec![c.item.id.clone()],
    }
}
