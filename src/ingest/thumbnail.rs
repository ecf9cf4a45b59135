// src/ingest/thumbnail.rs
//! Social-preview image lookup (`og:image`, then `twitter:image`).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use crate::ingest::types::{FetchOutcome, ThumbnailSource};

// Some newsroom sites refuse non-browser agents.
const BROWSER_UA: &str = "Mozilla/5.0";

static RE_META: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta regex"));
static RE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attr regex")
});

/// Pull the preview image URL out of an HTML page, if it declares one.
pub fn extract_preview_image(html: &str) -> Option<String> {
    let mut og = None;
    let mut twitter = None;

    for tag in RE_META.find_iter(html) {
        let mut key = None;
        let mut content = None;
        for cap in RE_ATTR.captures_iter(tag.as_str()) {
            let name = cap[1].to_ascii_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match name.as_str() {
                "property" | "name" => key = Some(value.trim().to_ascii_lowercase()),
                "content" => content = Some(value.trim().to_string()),
                _ => {}
            }
        }
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            continue;
        };
        match key.as_deref() {
            Some("og:image") if og.is_none() => og = Some(content),
            Some("twitter:image") if twitter.is_none() => twitter = Some(content),
            _ => {}
        }
    }

    og.or(twitter)
        .map(|u| html_escape::decode_html_entities(&u).to_string())
}

/// Fetches article pages over HTTP with a short deadline.
pub struct HttpThumbnails {
    client: reqwest::Client,
}

impl HttpThumbnails {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_UA)
            .build()
            .context("building thumbnail http client")?;
        Ok(Self { client })
    }

    async fn lookup(&self, article_url: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(article_url)
            .send()
            .await
            .context("article http get()")?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(anyhow!("article returned HTTP {}", resp.status()));
        }
        let html = resp.text().await.context("article http .text()")?;
        let Some(found) = extract_preview_image(&html) else {
            return Ok(None);
        };
        // Relative or scheme-less image paths are resolved against the article.
        let base = reqwest::Url::parse(article_url).context("article url")?;
        let abs = base.join(&found).context("preview image url")?;
        Ok(Some(abs.to_string()))
    }
}

#[async_trait]
impl ThumbnailSource for HttpThumbnails {
    async fn thumbnail(&self, article_url: &str) -> FetchOutcome<Option<String>> {
        self.lookup(article_url)
            .await
            .map_err(|e| format!("{e:#}"))
            .into()
    }
}
