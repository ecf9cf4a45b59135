use anyhow::Context;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{send_checked, ChatSink};
use crate::config::Platform;
use crate::error::{NotifierError, Result};
use crate::render::{MessageBody, OutputFormat};

/// Discord allows up to 10 embeds per webhook execution.
const MAX_EMBEDS_PER_REQUEST: usize = 10;

pub fn accepts(status: u16) -> bool {
    matches!(status, 200 | 204)
}

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("building Discord http client")?;
        Ok(Self {
            webhook,
            client,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Embeds travel together; plain text goes one message per request.
    pub fn payload(messages: &[MessageBody]) -> Result<DiscordWebhookPayload> {
        if let [MessageBody::Text { text }] = messages {
            return Ok(DiscordWebhookPayload {
                content: Some(text.clone()),
                embeds: Vec::new(),
            });
        }
        let embeds = messages
            .iter()
            .map(|m| match m {
                MessageBody::Embed { embed } => Ok(embed.clone()),
                MessageBody::Text { .. } => Err(NotifierError::ConfigInvalid(
                    "Discord takes one text message per request".into(),
                )),
                MessageBody::Flex { .. } => Err(NotifierError::ConfigInvalid(
                    "flex messages cannot be sent to Discord".into(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DiscordWebhookPayload {
            content: None,
            embeds,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DiscordWebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Value>,
}

#[async_trait::async_trait]
impl ChatSink for DiscordNotifier {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    fn max_objects(&self, format: OutputFormat) -> usize {
        match format {
            OutputFormat::Embed => MAX_EMBEDS_PER_REQUEST,
            _ => 1,
        }
    }

    async fn send(&self, messages: &[MessageBody]) -> Result<()> {
        let payload = Self::payload(messages)?;
        let req = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(&payload);
        send_checked(req, Platform::Discord, accepts).await
    }
}
