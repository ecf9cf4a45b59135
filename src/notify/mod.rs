// src/notify/mod.rs
pub mod discord;
pub mod dispatch;
pub mod line;

use reqwest::RequestBuilder;

use crate::config::{NotifierConfig, Platform};
use crate::error::{NotifierError, Result};
use crate::render::{MessageBody, OutputFormat};

pub use discord::DiscordNotifier;
pub use dispatch::{dispatch, DispatchReport};
pub use line::LineNotifier;

/// Outbound side of a chat platform: one call, one HTTP request.
#[async_trait::async_trait]
pub trait ChatSink: Send + Sync {
    fn platform(&self) -> Platform;

    /// Message objects the platform accepts in a single request.
    fn max_objects(&self, format: OutputFormat) -> usize;

    async fn send(&self, messages: &[MessageBody]) -> Result<()>;
}

/// Build the sink for the configured platform.
pub fn build_sink(cfg: &NotifierConfig) -> anyhow::Result<Box<dyn ChatSink>> {
    let sink: Box<dyn ChatSink> = match cfg.platform {
        Platform::Line => Box::new(
            LineNotifier::new(cfg.credential.clone(), cfg.line_to.clone())?
                .with_timeout(cfg.request_timeout),
        ),
        Platform::Discord => Box::new(
            DiscordNotifier::new(cfg.credential.clone())?.with_timeout(cfg.request_timeout),
        ),
    };
    Ok(sink)
}

/// Send a prepared request and map the outcome onto the error taxonomy.
/// `accepts` decides which status codes count as delivered.
pub(crate) async fn send_checked(
    req: RequestBuilder,
    platform: Platform,
    accepts: fn(u16) -> bool,
) -> Result<()> {
    let rsp = req.send().await.map_err(|e| NotifierError::Transport {
        platform,
        reason: e.to_string(),
    })?;
    let status = rsp.status().as_u16();
    if accepts(status) {
        return Ok(());
    }
    let body = rsp.text().await.unwrap_or_default();
    Err(NotifierError::DispatchRejected {
        platform,
        status,
        body,
    })
}
