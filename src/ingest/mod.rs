// src/ingest/mod.rs
pub mod providers;
pub mod thumbnail;
pub mod types;

use crate::ingest::types::{FeedItem, FeedSource, FetchOutcome};
use metrics::counter;
use std::collections::HashSet;

const MAX_TEXT_CHARS: usize = 1_500;

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace (includes the ideographic space U+3000)
    out = out.split_whitespace().collect::<Vec<_>>().join(" ");

    // 4) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }

    out
}

/// Keep the first occurrence of each link, in input order.
pub fn dedup_by_link(items: Vec<FeedItem>) -> (Vec<FeedItem>, usize) {
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(items.len());
    let mut dropped = 0usize;
    for it in items {
        if !seen_links.insert(it.link.clone()) {
            dropped += 1;
            continue;
        }
        keep.push(it);
    }
    (keep, dropped)
}

/// Fetch every source in order. An unavailable source is logged and
/// contributes nothing; it never aborts the run.
pub async fn collect(sources: &[Box<dyn FeedSource>]) -> Vec<FeedItem> {
    crate::telemetry::ensure_metrics_described();

    let mut raw = Vec::new();
    for src in sources {
        match src.fetch().await {
            FetchOutcome::Ok(mut v) => {
                tracing::debug!(feed = src.name(), count = v.len(), "feed fetched");
                raw.append(&mut v);
            }
            FetchOutcome::Unavailable(reason) => {
                tracing::warn!(feed = src.name(), %reason, "feed unavailable");
                counter!("notifier_feed_errors_total").increment(1);
            }
        }
    }

    let (kept, dup) = dedup_by_link(raw);
    if dup > 0 {
        tracing::debug!(duplicates = dup, "dropped entries repeated across feeds");
    }
    kept
}
