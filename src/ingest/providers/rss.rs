// src/ingest/providers/rss.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::types::{FeedItem, FeedSource, FetchOutcome};

/// Text content of an element, ignoring its attributes (`<title type="html">`).
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Child elements are matched by local name, so `<title>` and `<media:title>`
/// (or `<link>` and `<atom:link/>`) land in the same field. Collect them all
/// and keep the first one with content.
fn first_text(nodes: Vec<TextNode>) -> String {
    nodes
        .into_iter()
        .map(|t| t.value)
        .find(|v| !v.trim().is_empty())
        .unwrap_or_default()
}

fn first_opt(nodes: Vec<TextNode>) -> Option<String> {
    Some(first_text(nodes)).filter(|v| !v.is_empty())
}

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    link: Vec<TextNode>,
    #[serde(default)]
    guid: Vec<TextNode>,
    #[serde(default)]
    description: Vec<TextNode>,
    #[serde(rename = "pubDate", default)]
    pub_date: Vec<TextNode>,
    // dc:date
    #[serde(default)]
    date: Vec<TextNode>,
}

// --- RSS 1.0 (RDF) ---

#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    item: Vec<RdfItem>,
}

#[derive(Debug, Deserialize)]
struct RdfItem {
    // rdf:about
    #[serde(rename = "@about")]
    about: Option<String>,
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    link: Vec<TextNode>,
    #[serde(default)]
    description: Vec<TextNode>,
    #[serde(default)]
    date: Vec<TextNode>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: Vec<TextNode>,
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    link: Vec<AtomLink>,
    #[serde(default)]
    summary: Vec<TextNode>,
    #[serde(default)]
    content: Vec<TextNode>,
    #[serde(default)]
    published: Vec<TextNode>,
    #[serde(default)]
    updated: Vec<TextNode>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Rss,
    Rdf,
    Atom,
}

/// Pick the dialect from the local name of the root element. Anything that
/// is not `<feed>` or `<RDF>` is handed to the RSS 2.0 parser, which reports
/// a proper error for non-feeds.
fn sniff_dialect(xml: &str) -> Dialect {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"feed" => Dialect::Atom,
                    b"RDF" => Dialect::Rdf,
                    _ => Dialect::Rss,
                };
            }
            Ok(Event::Eof) | Err(_) => return Dialect::Rss,
            Ok(_) => {}
        }
    }
}

/// Assemble a feed item; entries without any usable link are dropped.
fn build_item(
    id: String,
    title: String,
    summary: String,
    link: String,
    published: Option<String>,
) -> Option<FeedItem> {
    let link = link.trim().to_string();
    let id = id.trim().to_string();
    let id = if id.is_empty() { link.clone() } else { id };
    if link.is_empty() {
        return None;
    }
    Some(FeedItem {
        id,
        title: normalize_text(&title),
        summary: normalize_text(&summary),
        link,
        published: published
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    })
}

/// Parse an RSS 2.0, RSS 1.0 (RDF) or Atom document into feed items.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let out = match sniff_dialect(&xml_clean) {
        Dialect::Rss => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss 2.0 xml")?;
            rss.channel
                .item
                .into_iter()
                .filter_map(|it| {
                    let published = first_opt(it.pub_date).or_else(|| first_opt(it.date));
                    build_item(
                        first_text(it.guid),
                        first_text(it.title),
                        first_text(it.description),
                        first_text(it.link),
                        published,
                    )
                })
                .collect()
        }
        Dialect::Rdf => {
            let rdf: Rdf = from_str(&xml_clean).context("parsing rss 1.0 (rdf) xml")?;
            rdf.item
                .into_iter()
                .filter_map(|it| {
                    build_item(
                        it.about.unwrap_or_default(),
                        first_text(it.title),
                        first_text(it.description),
                        first_text(it.link),
                        first_opt(it.date),
                    )
                })
                .collect()
        }
        Dialect::Atom => {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            feed.entry
                .into_iter()
                .filter_map(|en| {
                    let links: Vec<&AtomLink> =
                        en.link.iter().filter(|l| !l.href.trim().is_empty()).collect();
                    let link = links
                        .iter()
                        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                        .or_else(|| links.first())
                        .map(|l| l.href.clone())
                        .unwrap_or_default();
                    let summary = first_opt(en.summary)
                        .or_else(|| first_opt(en.content))
                        .unwrap_or_default();
                    let published = first_opt(en.published).or_else(|| first_opt(en.updated));
                    build_item(
                        first_text(en.id),
                        first_text(en.title),
                        summary,
                        link,
                        published,
                    )
                })
                .collect()
        }
    };
    Ok(out)
}

/// A single RSS/Atom endpoint, or a canned document in tests.
pub struct RssFeedSource {
    name: String,
    mode: Mode,
}

enum Mode {
    // Own copy so tests need not hold a 'static document.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeedSource {
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("car-news-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building feed http client")?;
        Ok(Self {
            name: url.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    async fn fetch_body(url: &str, client: &reqwest::Client) -> Result<String> {
        let resp = client.get(url).send().await.context("feed http get()")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("feed returned HTTP {status}"));
        }
        resp.text().await.context("feed http .text()")
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self) -> FetchOutcome<Vec<FeedItem>> {
        let parsed = match &self.mode {
            Mode::Fixture(s) => parse_feed(s),
            Mode::Http { url, client } => match Self::fetch_body(url, client).await {
                Ok(body) => parse_feed(&body),
                Err(e) => Err(e),
            },
        };
        match parsed {
            Ok(items) => {
                counter!("notifier_items_fetched_total").increment(items.len() as u64);
                FetchOutcome::Ok(items)
            }
            Err(e) => FetchOutcome::unavailable(format!("{e:#}")),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_falls_back_to_link_and_linkless_items_drop() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item><title>A</title><link>https://a.test/1</link></item>
  <item><title>B</title><guid isPermaLink="false">id-2</guid><link>https://a.test/2</link></item>
  <item><title>no link</title><guid>id-3</guid></item>
</channel></rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "https://a.test/1");
        assert_eq!(items[1].id, "id-2");
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn empty_channel_is_ok() {
        let xml = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_feed("<html><body>not a feed").is_err());
    }

    #[test]
    fn dialect_sniffing() {
        assert_eq!(
            sniff_dialect(r#"<?xml version="1.0"?><feed xmlns="x"></feed>"#),
            Dialect::Atom
        );
        assert_eq!(sniff_dialect(r#"<rdf:RDF xmlns:rdf="x"></rdf:RDF>"#), Dialect::Rdf);
        assert_eq!(sniff_dialect(r#"<rss version="2.0"></rss>"#), Dialect::Rss);
        assert_eq!(sniff_dialect("not xml"), Dialect::Rss);
    }

    #[test]
    fn feedburner_elements_do_not_make_rss_look_like_atom() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:feedburner="http://rssnamespace.org/feedburner/ext/1.0">
<channel><title>t</title><feedburner:info uri="carnews"/>
  <item><title>トヨタ A</title><link>https://a.test/1</link></item>
  <item><title>トヨタ B</title><link>https://a.test/2</link></item>
</channel></rss>"#;
        assert_eq!(sniff_dialect(xml), Dialect::Rss);
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "トヨタ B");
    }

    #[test]
    fn namespaced_siblings_do_not_break_an_item() {
        let xml = r#"<rss version="2.0"
     xmlns:atom="http://www.w3.org/2005/Atom"
     xmlns:media="http://search.yahoo.com/mrss/"
     xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel><title>t</title>
  <atom:link href="https://a.test/rss" rel="self"/>
  <item>
    <title>トヨタ A</title>
    <media:title>別タイトル</media:title>
    <link>https://a.test/1</link>
    <atom:link href="https://a.test/amp/1" rel="amphtml"/>
    <dc:date>2025-10-07T09:00:00+09:00</dc:date>
  </item>
  <item>
    <atom:link href="https://a.test/amp/2"/>
    <link>https://a.test/2</link>
    <title>トヨタ B</title>
  </item>
</channel></rss>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "トヨタ A");
        assert_eq!(items[0].link, "https://a.test/1");
        assert_eq!(items[0].published.as_deref(), Some("2025-10-07T09:00:00+09:00"));
        // the self-closing atom:link has no text, so the plain link is used
        assert_eq!(items[1].link, "https://a.test/2");
    }
}
