use std::path::PathBuf;

use clap::{Parser, Subcommand};
use logrelay_slack::DEFAULT_SLACK_API_BASE;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "logrelay",
    about = "Watches a Slack channel for alerts and log requests and stages the mapped service logs",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "slack-bot-token",
        env = "LOGRELAY_SLACK_BOT_TOKEN",
        global = true,
        hide_env_values = true,
        help = "Slack bot token (xoxb-...). Falls back to SLACK_BOT_TOKEN from --service-map-file"
    )]
    pub(crate) slack_bot_token: Option<String>,

    #[arg(
        long = "slack-channel",
        env = "LOGRELAY_SLACK_CHANNEL",
        global = true,
        help = "Channel id to watch and post to. Falls back to SLACK_CHANNEL or CHANNEL_ID from --service-map-file"
    )]
    pub(crate) slack_channel: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "LOGRELAY_SLACK_API_BASE",
        global = true,
        default_value = DEFAULT_SLACK_API_BASE,
        help = "Base URL for the Slack Web API"
    )]
    pub(crate) slack_api_base: String,

    #[arg(
        long = "service",
        value_name = "SERVICE=PATH",
        global = true,
        help = "Map a service tag to its source log file. Repeatable; overrides --service-map-file entries"
    )]
    pub(crate) service: Vec<String>,

    #[arg(
        long = "service-map-file",
        env = "LOGRELAY_SERVICE_MAP_FILE",
        value_delimiter = ',',
        global = true,
        help = ".properties files with <service>=<path> lines and optional Slack settings. Later files win"
    )]
    pub(crate) service_map_file: Vec<PathBuf>,

    #[arg(
        long = "output-dir",
        env = "LOGRELAY_OUTPUT_DIR",
        default_value = "staged-logs",
        global = true,
        help = "Directory that receives <service>.log copies; created when missing"
    )]
    pub(crate) output_dir: PathBuf,

    #[arg(
        long = "poll-interval-ms",
        env = "LOGRELAY_POLL_INTERVAL_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        global = true,
        help = "Delay between channel history polls"
    )]
    pub(crate) poll_interval_ms: u64,

    #[arg(
        long = "history-limit",
        env = "LOGRELAY_HISTORY_LIMIT",
        default_value_t = 10,
        value_parser = parse_positive_usize,
        global = true,
        help = "Number of most recent channel messages fetched per poll"
    )]
    pub(crate) history_limit: usize,

    #[arg(
        long = "request-timeout-ms",
        env = "LOGRELAY_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        global = true,
        help = "Timeout for each Slack API request"
    )]
    pub(crate) request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "LOGRELAY_RETRY_MAX_ATTEMPTS",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        global = true,
        help = "Attempts per Slack request on rate limits and server errors. 1 leaves retries to the next poll"
    )]
    pub(crate) retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "LOGRELAY_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        global = true,
        help = "Base delay for exponential backoff between request attempts"
    )]
    pub(crate) retry_base_delay_ms: u64,

    #[arg(
        long = "event-log",
        env = "LOGRELAY_EVENT_LOG",
        global = true,
        help = "Optional JSONL file that records every staging outcome"
    )]
    pub(crate) event_log: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum CliCommand {
    /// Poll the channel and stage logs until interrupted (default).
    Watch,
    /// List configured services and their source log paths.
    Services,
    /// Print how a message text would be classified.
    Classify {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Post a simulated alert message to the channel.
    SendAlert {
        #[arg(long, help = "Alert body; defaults to one of the built-in sample entries")]
        message: Option<String>,
    },
}
