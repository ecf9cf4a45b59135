//! # Message packer
//!
//! Greedy first-fit packing of rendered item blocks into text messages whose
//! length is measured in UTF-16 code units (what LINE and Discord count).
//!
//! - Every unit starts with the same header.
//! - Blocks are never split or reordered.
//! - A block too large for an empty unit still gets a unit of its own; the
//!   unit is flagged `oversized` and logged, not truncated.

/// Rendered text for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemBlock {
    pub id: String,
    pub text: String,
}

/// One outgoing text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUnit {
    pub text: String,
    pub item_ids: Vec<String>,
    pub oversized: bool,
}

/// Length of `s` in UTF-16 code units; astral-plane characters count twice.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[derive(Debug, Clone)]
pub struct MessagePacker<'a> {
    header: &'a str,
    separator: &'a str,
    max_units: usize,
}

impl<'a> MessagePacker<'a> {
    pub fn new(header: &'a str, separator: &'a str, max_units: usize) -> Self {
        Self {
            header,
            separator,
            max_units,
        }
    }

    pub fn pack(&self, blocks: &[ItemBlock]) -> Vec<MessageUnit> {
        let header_len = utf16_len(self.header);
        let sep_len = utf16_len(self.separator);

        let mut out = Vec::new();
        let mut current = String::from(self.header);
        let mut current_len = header_len;
        let mut ids: Vec<String> = Vec::new();

        for block in blocks {
            let add = utf16_len(&block.text) + sep_len;
            if current_len + add > self.max_units && !ids.is_empty() {
                out.push(self.close(&current, std::mem::take(&mut ids)));
                current = String::from(self.header);
                current_len = header_len;
            }
            current.push_str(&block.text);
            current.push_str(self.separator);
            current_len += add;
            ids.push(block.id.clone());
        }

        if !ids.is_empty() {
            out.push(self.close(&current, ids));
        }
        out
    }

    fn close(&self, current: &str, item_ids: Vec<String>) -> MessageUnit {
        let text = current.trim_end().to_string();
        let len = utf16_len(&text);
        let oversized = len > self.max_units;
        if oversized {
            tracing::warn!(
                len,
                max = self.max_units,
                item = item_ids.first().map(String::as_str).unwrap_or_default(),
                "single item exceeds message size limit; sending it whole"
            );
        }
        MessageUnit {
            text,
            item_ids,
            oversized,
        }
    }
}
