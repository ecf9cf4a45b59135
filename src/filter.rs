//! # Item filter
//!
//! Classifies a feed item into at most one brand category plus a priority
//! flag. Pure: no I/O, no clock, no environment.
//!
//! - Brand: case-insensitive substring search over the ordered keyword list;
//!   the first listed keyword that occurs wins (not the longest).
//! - Priority: compact tag token in the whitespace-free text, or every
//!   marker substring present somewhere in the text.
//! - Full-width ASCII (`ＧＲ８６`) is folded to half-width before matching.

use crate::config::{BrandKeyword, NotifierConfig, PriorityRule};
use crate::ingest::types::FeedItem;

/// Category label for items that matched only the priority tag.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// A feed item that matched at least one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub item: FeedItem,
    pub is_priority: bool,
    pub category: String,
}

impl Candidate {
    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn has_brand(&self) -> bool {
        self.category != UNKNOWN_CATEGORY
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ItemFilter<'a> {
    brands: &'a [BrandKeyword],
    priority: &'a PriorityRule,
}

impl<'a> ItemFilter<'a> {
    pub fn new(brands: &'a [BrandKeyword], priority: &'a PriorityRule) -> Self {
        Self { brands, priority }
    }

    pub fn from_config(cfg: &'a NotifierConfig) -> Self {
        Self::new(&cfg.brands, &cfg.priority)
    }

    /// `None` when the item matches neither a brand nor the priority tag.
    pub fn classify(&self, item: &FeedItem) -> Option<Candidate> {
        let brand = detect_brand(&item.title, &item.summary, self.brands);
        let is_priority = is_priority(&item.title, &item.summary, self.priority);
        if brand.is_none() && !is_priority {
            return None;
        }
        Some(Candidate {
            item: item.clone(),
            is_priority,
            category: brand.unwrap_or(UNKNOWN_CATEGORY).to_string(),
        })
    }
}

/// Map full-width ASCII variants and the ideographic space to plain ASCII.
pub fn fold_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

fn haystack(title: &str, summary: &str) -> String {
    fold_width(&format!("{title} {summary}")).to_lowercase()
}

/// First brand keyword (in list order) contained in title + summary.
pub fn detect_brand<'b>(title: &str, summary: &str, brands: &'b [BrandKeyword]) -> Option<&'b str> {
    let text = haystack(title, summary);
    brands
        .iter()
        .map(|b| b.keyword.as_str())
        .find(|k| {
            let needle = fold_width(k).to_lowercase();
            !needle.is_empty() && text.contains(&needle)
        })
}

pub fn is_priority(title: &str, summary: &str, rule: &PriorityRule) -> bool {
    let text = haystack(title, summary);
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let token_hit = rule.tokens.iter().any(|t| {
        let t = fold_width(t).to_lowercase();
        !t.is_empty() && compact.contains(&t)
    });
    if token_hit {
        return true;
    }

    !rule.markers.is_empty()
        && rule.markers.iter().all(|m| {
            let m = fold_width(m).to_lowercase();
            !m.is_empty() && text.contains(&m)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_brands;

    fn feed(title: &str, summary: &str) -> FeedItem {
        FeedItem {
            id: "id".into(),
            title: title.into(),
            summary: summary.into(),
            link: "https://x.test/a".into(),
            published: None,
        }
    }

    #[test]
    fn first_listed_keyword_wins_not_longest() {
        let brands = default_brands();
        // "GR" is listed before "GR86"
        assert_eq!(detect_brand("GR86 改良", "", &brands), Some("GR"));
        assert_eq!(detect_brand("レクサスとトヨタ", "", &brands), Some("トヨタ"));
    }

    #[test]
    fn brand_match_is_case_insensitive_and_uses_summary() {
        let brands = vec![BrandKeyword::new("Toyota", None)];
        assert_eq!(detect_brand("News", "new TOYOTA plant", &brands), Some("Toyota"));
        assert_eq!(detect_brand("News", "nothing", &brands), None);
    }

    #[test]
    fn priority_compact_token_ignores_whitespace() {
        let rule = PriorityRule::default();
        assert!(is_priority("新型 GR 86 登場", "", &rule));
        assert!(is_priority("ＧＲ８６ 限定車", "", &rule));
        assert!(is_priority("gr-86 cup", "", &rule));
    }

    #[test]
    fn priority_markers_anywhere() {
        let rule = PriorityRule::default();
        assert!(is_priority("GR Yaris", "車両重量は1286kg", &rule));
        assert!(!is_priority("GR Yaris", "新色追加", &rule));
    }

    #[test]
    fn empty_marker_list_disables_loose_rule() {
        let rule = PriorityRule {
            label: "X".into(),
            tokens: vec![],
            markers: vec![],
            color: None,
        };
        assert!(!is_priority("anything", "", &rule));
    }

    #[test]
    fn classify_discards_non_matches_and_labels_unknown() {
        let brands = vec![BrandKeyword::new("Toyota", None)];
        let rule = PriorityRule::default();
        let f = ItemFilter::new(&brands, &rule);

        assert!(f.classify(&feed("Weather", "sunny")).is_none());

        let c = f.classify(&feed("GR86 cup", "")).unwrap();
        assert!(c.is_priority);
        assert_eq!(c.category, UNKNOWN_CATEGORY);
        assert!(!c.has_brand());

        let c = f.classify(&feed("Toyota news", "")).unwrap();
        assert!(!c.is_priority);
        assert_eq!(c.category, "Toyota");
    }
}
