// src/render/flex.rs
use serde_json::{json, Value};

use super::{short, MessageBody, OutboundMessage, RenderItem};
use crate::config::NotifierConfig;

// LINE rejects altText longer than 400 characters.
const ALT_TEXT_MAX: usize = 400;
const SUMMARY_MAX: usize = 120;
const DEFAULT_BRAND_COLOR: u32 = 0x2D9CDB;

fn hex(color: u32) -> String {
    format!("#{:06X}", color & 0xFF_FFFF)
}

/// One LINE flex bubble per candidate.
pub fn render(it: &RenderItem, cfg: &NotifierConfig) -> OutboundMessage {
    let c = &it.candidate;
    let accent = if c.is_priority {
        cfg.priority.color
    } else {
        None
    }
    .or_else(|| cfg.brand_color(&c.category))
    .unwrap_or(DEFAULT_BRAND_COLOR);

    let mut body: Vec<Value> = Vec::new();
    if c.is_priority {
        body.push(json!({
            "type": "text",
            "text": format!("🔥 {}速報", cfg.priority.label),
            "size": "xs",
            "weight": "bold",
            "color": hex(cfg.priority.color.unwrap_or(accent)),
        }));
    }
    body.push(json!({
        "type": "text",
        "text": short(it.title(), 200),
        "weight": "bold",
        "size": "md",
        "wrap": true,
    }));
    body.push(json!({
        "type": "text",
        "text": it.brand_label(),
        "size": "sm",
        "color": hex(accent),
    }));
    if !c.item.summary.is_empty() {
        body.push(json!({
            "type": "text",
            "text": short(&c.item.summary, SUMMARY_MAX),
            "size": "sm",
            "color": "#666666",
            "wrap": true,
        }));
    }
    if let Some(p) = &c.item.published {
        body.push(json!({
            "type": "text",
            "text": p,
            "size": "xxs",
            "color": "#999999",
        }));
    }

    let mut bubble = json!({
        "type": "bubble",
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": body,
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "contents": [{
                "type": "button",
                "style": "link",
                "height": "sm",
                "action": { "type": "uri", "label": "記事を読む", "uri": c.item.link },
            }],
        },
    });
    if let Some(img) = it.thumbnail.as_ref().or(cfg.default_image.as_ref()) {
        bubble["hero"] = json!({
            "type": "image",
            "url": img,
            "size": "full",
            "aspectRatio": "20:13",
            "aspectMode": "cover",
            "action": { "type": "uri", "uri": c.item.link },
        });
    }

    OutboundMessage {
        body: MessageBody::Flex {
            alt_text: short(&format!("【{}】{}", it.brand_label(), it.title()), ALT_TEXT_MAX),
            contents: bubble,
        },
        item_ids: vec![c.item.id.clone()],
    }
}
