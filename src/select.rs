// src/select.rs
use std::collections::HashSet;

use crate::filter::{Candidate, ItemFilter};
use crate::ingest::types::FeedItem;
use crate::store::SentIdSet;

/// Classify fresh items, skipping identifiers that were already notified.
/// An id repeated within the run (same guid, different link) counts once;
/// the first occurrence wins.
pub fn unsent_candidates(
    items: &[FeedItem],
    sent: &SentIdSet,
    filter: &ItemFilter<'_>,
) -> Vec<Candidate> {
    let mut seen: HashSet<&str> = HashSet::new();
    items
        .iter()
        .filter(|it| !it.id.is_empty() && !sent.contains(&it.id))
        .filter(|&it| seen.insert(it.id.as_str()))
        .filter_map(|it| filter.classify(it))
        .collect()
}

/// Priority candidates first (stable within each group), then truncate.
pub fn select(candidates: &[Candidate], max_posts_per_run: usize) -> Vec<Candidate> {
    let mut ordered = candidates.to_vec();
    // `sort_by_key` is stable; `false < true`, so negate to put priority first.
    ordered.sort_by_key(|c| !c.is_priority);
    ordered.truncate(max_posts_per_run);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrandKeyword, PriorityRule};

    fn cand(id: &str, prio: bool) -> Candidate {
        Candidate {
            item: FeedItem {
                id: id.into(),
                title: id.into(),
                summary: String::new(),
                link: format!("https://x.test/{id}"),
                published: None,
            },
            is_priority: prio,
            category: "Toyota".into(),
        }
    }

    fn ids(cs: &[Candidate]) -> Vec<&str> {
        cs.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn priority_first_and_stable() {
        let input = vec![
            cand("a", false),
            cand("b", true),
            cand("c", false),
            cand("d", true),
        ];
        let out = select(&input, 10);
        assert_eq!(ids(&out), ["b", "d", "a", "c"]);
        // input untouched
        assert_eq!(ids(&input), ["a", "b", "c", "d"]);
    }

    #[test]
    fn truncates_after_sorting() {
        let input = vec![cand("a", false), cand("b", false), cand("c", true)];
        assert_eq!(ids(&select(&input, 2)), ["c", "a"]);
        assert!(select(&input, 0).is_empty());
    }

    #[test]
    fn sent_ids_are_skipped_before_classification() {
        let brands = vec![BrandKeyword::new("Toyota", None)];
        let rule = PriorityRule::default();
        let filter = ItemFilter::new(&brands, &rule);
        let items = vec![cand("Toyota 1", false).item, cand("Toyota 2", false).item];
        let sent: SentIdSet = ["Toyota 1".to_string()].into_iter().collect();

        let out = unsent_candidates(&items, &sent, &filter);
        assert_eq!(ids(&out), ["Toyota 2"]);
    }

    #[test]
    fn repeated_guid_across_links_is_classified_once() {
        let brands = vec![BrandKeyword::new("Toyota", None)];
        let rule = PriorityRule::default();
        let filter = ItemFilter::new(&brands, &rule);
        let first = cand("Toyota 1", false).item;
        let mut mirror = first.clone();
        mirror.link = "https://mirror.test/toyota-1".into();
        let items = vec![first, cand("Toyota 2", false).item, mirror];

        let out = unsent_candidates(&items, &SentIdSet::new(), &filter);
        assert_eq!(ids(&out), ["Toyota 1", "Toyota 2"]);
        assert_eq!(out[0].item.link, "https://x.test/Toyota 1");
    }
}
