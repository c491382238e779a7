//! Slack Web API delivery.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://slack.com";
/// Fallback text Slack renders where blocks are not supported.
const FALLBACK_TEXT: &str = "Failed to render content";

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack request for channel '{channel}' failed")]
    Transport {
        channel: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("slack rejected the message to channel '{channel}': {reason}")]
    Rejected { channel: String, reason: String },
}

/// Destination for formatted Block Kit messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn post_blocks(&self, channel: &str, blocks: &[Value]) -> Result<(), SlackError>;
}

pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// chat.postMessage envelope; Slack reports failures with a 200 status and
/// `ok: false`.
#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[async_trait]
impl MessageSink for SlackClient {
    async fn post_blocks(&self, channel: &str, blocks: &[Value]) -> Result<(), SlackError> {
        let payload = json!({
            "channel": channel,
            "blocks": blocks,
            "text": FALLBACK_TEXT,
            "unfurl_links": false,
            "unfurl_media": false,
        });

        let response = self
            .http
            .post(format!("{}/api/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|source| SlackError::Transport {
                channel: channel.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Rejected {
                channel: channel.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let body: PostMessageResponse =
            response.json().await.map_err(|source| SlackError::Transport {
                channel: channel.to_string(),
                source,
            })?;
        if !body.ok {
            return Err(SlackError::Rejected {
                channel: channel.to_string(),
                reason: body.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        tracing::debug!(channel, "Slack accepted the message");
        Ok(())
    }
}
