// src/notify/line.rs
use anyhow::Context;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{send_checked, ChatSink};
use crate::config::Platform;
use crate::error::{NotifierError, Result};
use crate::render::{MessageBody, OutputFormat};

const API_BASE: &str = "https://api.line.me";
/// Messaging API cap on message objects per push/broadcast.
const MAX_MESSAGES_PER_REQUEST: usize = 5;

pub fn accepts(status: u16) -> bool {
    matches!(status, 200 | 201)
}

#[derive(Clone)]
pub struct LineNotifier {
    token: String,
    to: Option<String>,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl LineNotifier {
    /// Broadcast to all friends, or push to `to` when given.
    pub fn new(token: String, to: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().build().context("building LINE http client")?;
        Ok(Self {
            token,
            to,
            base_url: API_BASE.to_string(),
            client,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point at a different API host (local stub servers).
    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        match self.to {
            Some(_) => format!("{}/v2/bot/message/push", self.base_url),
            None => format!("{}/v2/bot/message/broadcast", self.base_url),
        }
    }

    pub fn payload(&self, messages: &[MessageBody]) -> Result<LinePayload> {
        let messages = messages.iter().map(encode).collect::<Result<Vec<_>>>()?;
        Ok(LinePayload {
            to: self.to.clone(),
            messages,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LinePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub messages: Vec<Value>,
}

fn encode(m: &MessageBody) -> Result<Value> {
    match m {
        MessageBody::Text { text } => Ok(json!({ "type": "text", "text": text })),
        MessageBody::Flex { alt_text, contents } => Ok(json!({
            "type": "flex",
            "altText": alt_text,
            "contents": contents,
        })),
        MessageBody::Embed { .. } => Err(NotifierError::ConfigInvalid(
            "embed messages cannot be sent to LINE".into(),
        )),
    }
}

#[async_trait::async_trait]
impl ChatSink for LineNotifier {
    fn platform(&self) -> Platform {
        Platform::Line
    }

    fn max_objects(&self, _format: OutputFormat) -> usize {
        MAX_MESSAGES_PER_REQUEST
    }

    async fn send(&self, messages: &[MessageBody]) -> Result<()> {
        let payload = self.payload(messages)?;
        let req = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(&payload);
        send_checked(req, Platform::Line, accepts).await
    }
}
