// src/render/text.rs
use super::{MessageBody, OutboundMessage, RenderItem};
use crate::config::NotifierConfig;
use crate::pack::{ItemBlock, MessagePacker};

pub const BLOCK_SEPARATOR: &str = "\n\n";
const PRIORITY_PREFIX: &str = "🔥 ";

pub fn item_block(it: &RenderItem) -> ItemBlock {
    let c = &it.candidate;
    let prefix = if c.is_priority { PRIORITY_PREFIX } else { "" };
    ItemBlock {
        id: c.item.id.clone(),
        text: format!(
            "{prefix}【{}】{}\n{}",
            it.brand_label(),
            it.title(),
            c.item.link
        ),
    }
}

pub fn render(items: &[RenderItem], cfg: &NotifierConfig) -> Vec<OutboundMessage> {
    let blocks: Vec<ItemBlock> = items.iter().map(item_block).collect();
    MessagePacker::new(&cfg.text_header, BLOCK_SEPARATOR, cfg.max_unit_size)
        .pack(&blocks)
        .into_iter()
        .map(|unit| OutboundMessage {
            body: MessageBody::Text { text: unit.text },
            item_ids: unit.item_ids,
        })
        .collect()
}
