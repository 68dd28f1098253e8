//! Slack Web API plumbing for the logrelay alert watcher.
//!
//! Exposes the channel-history seam the watcher polls through, the Slack
//! message timestamp type used as the watcher watermark, and the HTTP client
//! that implements both history reads and alert posting.

mod channel_history;
mod message_timestamp;
mod slack_api_client;
mod slack_helpers;

pub use channel_history::{ChannelHistory, ChannelMessage};
pub use message_timestamp::{MessageTimestamp, MessageTimestampError};
pub use slack_api_client::{SlackApiClient, SlackPostedMessage, DEFAULT_SLACK_API_BASE};
pub use slack_helpers::truncate_for_error;
