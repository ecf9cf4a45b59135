// src/ingest/types.rs

/// One entry as delivered by a feed. Never mutated after parsing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,      // guid/id, falls back to link
    pub title: String,   // normalized text
    pub summary: String, // normalized text, may be empty
    pub link: String,
    pub published: Option<String>, // raw feed value, unparsed
}

/// Result of talking to an unreliable collaborator (feed, article page).
///
/// `Unavailable` is a normal outcome: the caller logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Ok(T),
    Unavailable(String),
}

impl<T> FetchOutcome<T> {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        FetchOutcome::Unavailable(reason.to_string())
    }

    /// Collapse to the data, substituting `fallback` when unavailable.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            FetchOutcome::Ok(v) => v,
            FetchOutcome::Unavailable(_) => fallback,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for FetchOutcome<T> {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(v) => FetchOutcome::Ok(v),
            Err(e) => FetchOutcome::unavailable(e),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> FetchOutcome<Vec<FeedItem>>;
    fn name(&self) -> &str;
}

#[async_trait::async_trait]
pub trait ThumbnailSource: Send + Sync {
    /// Preview image for an article; `Ok(None)` when the page has none.
    async fn thumbnail(&self, article_url: &str) -> FetchOutcome<Option<String>>;
}
