//! # Run engine
//!
//! One run, strictly sequential:
//! `LOAD_STATE → FETCH → FILTER → SELECT → THUMBNAILS → RENDER/PACK →
//! DISPATCH → COMMIT | NO-OP`.
//!
//! Collaborators (feeds, thumbnails, chat sink, store) are passed in, so the
//! whole flow runs against in-memory fakes in tests.

use anyhow::{Context, Result};
use metrics::counter;
use std::fmt;

use crate::config::NotifierConfig;
use crate::error::NotifierError;
use crate::filter::ItemFilter;
use crate::ingest::providers::rss::RssFeedSource;
use crate::ingest::thumbnail::HttpThumbnails;
use crate::ingest::types::{FeedSource, FetchOutcome, ThumbnailSource};
use crate::notify::{build_sink, dispatch, ChatSink};
use crate::render::RenderItem;
use crate::store::SentIdStore;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub candidates: usize,
    pub selected: usize,
    pub messages: usize,
    pub delivered: usize,
    pub committed: usize,
    /// Set when dispatch stopped early.
    pub failure: Option<NotifierError>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            None if self.selected == 0 => write!(
                f,
                "0 items sent (fetched {}, nothing new or no matches)",
                self.fetched
            ),
            None => write!(
                f,
                "{} items sent in {} messages (fetched {}, candidates {})",
                self.delivered, self.messages, self.fetched, self.candidates
            ),
            Some(e) => write!(
                f,
                "dispatch failed after {} of {} items ({} committed): {e}",
                self.delivered, self.selected, self.committed
            ),
        }
    }
}

pub async fn run_once(
    cfg: &NotifierConfig,
    sources: &[Box<dyn FeedSource>],
    thumbnails: Option<&dyn ThumbnailSource>,
    sink: &dyn ChatSink,
    store: &SentIdStore,
) -> Result<RunSummary> {
    crate::telemetry::ensure_metrics_described();
    let mut summary = RunSummary::default();

    // LOAD_STATE
    let mut sent = store.load();
    tracing::info!(known = sent.len(), path = %store.path().display(), "sent ids loaded");

    // FETCH
    let items = crate::ingest::collect(sources).await;
    summary.fetched = items.len();

    // FILTER
    let filter = ItemFilter::from_config(cfg);
    let candidates = crate::select::unsent_candidates(&items, &sent, &filter);
    summary.candidates = candidates.len();
    counter!("notifier_candidates_total").increment(candidates.len() as u64);

    // SELECT
    let selected = crate::select::select(&candidates, cfg.max_posts_per_run);
    summary.selected = selected.len();
    tracing::info!(
        fetched = summary.fetched,
        candidates = summary.candidates,
        selected = summary.selected,
        "selection done"
    );
    if selected.is_empty() {
        return Ok(summary);
    }

    // THUMBNAILS
    let mut render_items: Vec<RenderItem> = selected.into_iter().map(RenderItem::new).collect();
    if let Some(thumbs) = thumbnails.filter(|_| cfg.thumbnails && cfg.format.uses_images()) {
        for it in &mut render_items {
            match thumbs.thumbnail(&it.candidate.item.link).await {
                FetchOutcome::Ok(img) => it.thumbnail = img,
                FetchOutcome::Unavailable(reason) => {
                    tracing::debug!(link = %it.candidate.item.link, %reason, "no thumbnail");
                }
            }
        }
    }

    // RENDER/PACK
    let messages = cfg.format.render(&render_items, cfg);
    summary.messages = messages.len();

    // DISPATCH
    let limit = cfg
        .max_objects_per_request
        .min(sink.max_objects(cfg.format));
    let report = dispatch(sink, &messages, limit, cfg.pacing).await;
    summary.delivered = report.delivered_ids.len();

    // COMMIT | NO-OP
    let commit = report.all_delivered() || cfg.commit_on_partial_success;
    if commit && !report.delivered_ids.is_empty() {
        let before = sent.len();
        sent.extend(report.delivered_ids.iter().cloned());
        summary.committed = sent.len() - before;
        store.save(&sent).context("saving sent ids")?;
        counter!("notifier_ids_committed_total").increment(summary.committed as u64);
        tracing::info!(committed = summary.committed, "sent ids saved");
    } else if !report.all_delivered() {
        tracing::warn!(
            delivered = summary.delivered,
            "dispatch incomplete; sent ids left unchanged"
        );
    }

    summary.failure = report.failure;
    Ok(summary)
}

/// Build the HTTP collaborators from `cfg` and run once.
pub async fn run_from_config(cfg: &NotifierConfig) -> Result<RunSummary> {
    let sources = cfg
        .feed_urls
        .iter()
        .map(|u| RssFeedSource::from_url(u, cfg.request_timeout).map(|s| Box::new(s) as Box<dyn FeedSource>))
        .collect::<Result<Vec<_>>>()?;
    let thumbs = HttpThumbnails::new(cfg.thumbnail_timeout)?;
    let sink = build_sink(cfg)?;
    let store = SentIdStore::new(&cfg.sent_ids_path);

    run_once(
        cfg,
        &sources,
        Some(&thumbs as &dyn ThumbnailSource),
        sink.as_ref(),
        &store,
    )
    .await
}
