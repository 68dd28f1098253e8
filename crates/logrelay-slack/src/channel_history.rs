//! Channel history seam used by the watcher poll loop.

use anyhow::Result;
use async_trait::async_trait;

/// One message returned by a channel history read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Raw Slack `ts` value, e.g. `1712345678.000200`. Empty when Slack omitted it.
    pub ts: String,
    /// Message body; empty when the message carried no text.
    pub text: String,
    /// Author user id when present.
    pub user: Option<String>,
}

impl ChannelMessage {
    pub fn new(ts: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            text: text.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

#[async_trait]
/// Read-only access to the most recent messages of a chat channel.
pub trait ChannelHistory: Send + Sync {
    /// Returns up to `limit` of the channel's most recent messages, newest first.
    async fn fetch_recent_messages(&self, channel: &str, limit: usize)
        -> Result<Vec<ChannelMessage>>;
}
