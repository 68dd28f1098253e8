//! Slack Web API client used by the watcher poll loop and the alert sender.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::channel_history::{ChannelHistory, ChannelMessage};
use crate::slack_helpers::{
    backoff_delay, retry_after_seconds, status_allows_retry, transport_allows_retry,
    truncate_for_error,
};

/// Public Slack Web API base URL.
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Deserialize)]
struct SlackAuthTestResponse {
    ok: bool,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackHistoryMessage {
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<SlackHistoryMessage>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Channel and timestamp of a message the client posted.
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Clone)]
/// Bot-token authenticated Slack Web API client.
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl SlackApiClient {
    pub fn new(
        api_base: String,
        bot_token: String,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("logrelay-alert-watcher"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    pub async fn resolve_bot_user_id(&self) -> Result<String> {
        let response: SlackAuthTestResponse = self
            .request_json("auth.test", || {
                self.http
                    .post(format!("{}/auth.test", self.api_base))
                    .bearer_auth(&self.bot_token)
            })
            .await?;

        if !response.ok {
            bail!(
                "slack auth.test failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        response
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack auth.test did not return user_id"))
    }

    /// Reads the newest `limit` messages of `channel` via `conversations.history`.
    pub async fn fetch_channel_history(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>> {
        let limit = limit.max(1).to_string();
        let response: SlackConversationsHistoryResponse = self
            .request_json("conversations.history", || {
                self.http
                    .get(format!("{}/conversations.history", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[("channel", channel), ("limit", limit.as_str())])
            })
            .await?;

        if !response.ok {
            bail!(
                "slack conversations.history failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(response
            .messages
            .into_iter()
            .map(|message| ChannelMessage {
                ts: message.ts.unwrap_or_default(),
                text: message.text.unwrap_or_default(),
                user: message.user,
            })
            .collect())
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<SlackPostedMessage> {
        let payload = json!({
            "channel": channel,
            "text": text,
            "unfurl_links": false,
            "unfurl_media": false,
        });

        let response: SlackChatMessageResponse = self
            .request_json("chat.postMessage", || {
                self.http
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload)
            })
            .await?;

        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    async fn request_json<T, F>(&self, operation: &str, mut builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header(
                    "x-logrelay-retry-attempt",
                    attempt.saturating_sub(1).to_string(),
                )
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode slack {operation}"))?;
                        return Ok(parsed);
                    }

                    let retry_after = retry_after_seconds(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if status_allows_retry(attempt, self.retry_max_attempts, status.as_u16()) {
                        tokio::time::sleep(backoff_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    bail!(
                        "slack api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 800)
                    );
                }
                Err(error) => {
                    if transport_allows_retry(attempt, self.retry_max_attempts, &error) {
                        tokio::time::sleep(backoff_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("slack api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl ChannelHistory for SlackApiClient {
    async fn fetch_recent_messages(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>> {
        self.fetch_channel_history(channel, limit).await
    }
}
