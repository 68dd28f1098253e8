use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use logrelay_core::current_unix_timestamp_ms;
use logrelay_slack::SlackApiClient;
use logrelay_watcher::{
    AlertWatcher, AlertWatcherConfig, ConfigProperties, MessageClass, MessageClassifier,
    ServiceFileMap, WatcherState,
};
use tracing::{info, warn};

use crate::cli_args::{Cli, CliCommand};

const SAMPLE_ALERT_ENTRIES: &[&str] = &[
    "ERROR: Connection to database failed after 3 attempts - auth-service",
    "WARNING: Disk usage exceeded 85% on server xyz - demo-app-service",
    "ERROR: Null pointer exception in module user-handler - user-service",
    "WARNING: High memory usage detected in pod ml-worker-4 - demo-app-service",
    "ERROR: Failed to fetch response from external API, timeout after 30s - demo-app-service",
];

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    match cli.command.clone().unwrap_or(CliCommand::Watch) {
        CliCommand::Watch => execute_watch(&cli).await,
        CliCommand::Services => execute_services(&cli),
        CliCommand::Classify { text } => execute_classify(&text.join(" ")),
        CliCommand::SendAlert { message } => execute_send_alert(&cli, message.as_deref()).await,
    }
}

async fn execute_watch(cli: &Cli) -> Result<()> {
    let properties = load_properties(cli)?;
    let service_map = ServiceFileMap::from_sources(&properties, &cli.service)?;
    if service_map.is_empty() {
        warn!("no services configured; every alert will be reported as unmapped");
    }
    let channel_id = resolve_channel(cli, &properties)?;
    let client = build_slack_client(cli, &properties)?;

    let bot_user_id = client
        .resolve_bot_user_id()
        .await
        .context("failed to verify slack bot token")?;
    info!(%bot_user_id, "slack bot token verified");

    let watcher = AlertWatcher::new(
        AlertWatcherConfig {
            channel_id,
            history_limit: cli.history_limit,
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
            output_dir: cli.output_dir.clone(),
            event_log_path: cli.event_log.clone(),
        },
        Arc::new(client),
        service_map,
    )?;
    watcher.run(WatcherState::starting_now()).await;
    Ok(())
}

fn execute_services(cli: &Cli) -> Result<()> {
    let properties = load_properties(cli)?;
    let service_map = ServiceFileMap::from_sources(&properties, &cli.service)?;
    println!("{}", render_service_list(&service_map));
    Ok(())
}

fn execute_classify(text: &str) -> Result<()> {
    let classifier = MessageClassifier::new().context("failed to compile message patterns")?;
    println!("{}", render_classification(&classifier.classify(text)));
    Ok(())
}

async fn execute_send_alert(cli: &Cli, message: Option<&str>) -> Result<()> {
    let properties = load_properties(cli)?;
    let channel_id = resolve_channel(cli, &properties)?;
    let client = build_slack_client(cli, &properties)?;

    let entry = match message.map(str::trim).filter(|value| !value.is_empty()) {
        Some(entry) => entry,
        None => sample_alert_entry(current_unix_timestamp_ms()),
    };
    let posted = client
        .post_message(&channel_id, &render_alert_text(entry))
        .await?;
    println!("posted alert to {} at ts {}", posted.channel, posted.ts);
    Ok(())
}

fn load_properties(cli: &Cli) -> Result<ConfigProperties> {
    Ok(ConfigProperties::load_files(&cli.service_map_file)?)
}

fn resolve_bot_token(cli: &Cli, properties: &ConfigProperties) -> Result<String> {
    cli.slack_bot_token
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| properties.get("SLACK_BOT_TOKEN"))
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow!(
                "missing Slack bot token: set --slack-bot-token, LOGRELAY_SLACK_BOT_TOKEN, or SLACK_BOT_TOKEN in a --service-map-file"
            )
        })
}

fn resolve_channel(cli: &Cli, properties: &ConfigProperties) -> Result<String> {
    cli.slack_channel
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| properties.first_of(&["SLACK_CHANNEL", "CHANNEL_ID"]))
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow!(
                "missing Slack channel: set --slack-channel, LOGRELAY_SLACK_CHANNEL, or SLACK_CHANNEL in a --service-map-file"
            )
        })
}

fn build_slack_client(cli: &Cli, properties: &ConfigProperties) -> Result<SlackApiClient> {
    SlackApiClient::new(
        cli.slack_api_base.clone(),
        resolve_bot_token(cli, properties)?,
        cli.request_timeout_ms,
        cli.retry_max_attempts,
        cli.retry_base_delay_ms,
    )
}

fn sample_alert_entry(seed: u64) -> &'static str {
    let index = (seed % SAMPLE_ALERT_ENTRIES.len() as u64) as usize;
    SAMPLE_ALERT_ENTRIES[index]
}

fn render_alert_text(entry: &str) -> String {
    format!(":rotating_light: *ALERT*: {entry}")
}

fn render_service_list(service_map: &ServiceFileMap) -> String {
    if service_map.is_empty() {
        return "no services configured".to_string();
    }
    let mut lines = vec![format!("configured services: {}", service_map.len())];
    lines.extend(
        service_map
            .iter()
            .map(|(service, path)| format!("- {service} -> {}", path.display())),
    );
    lines.join("\n")
}

fn render_classification(class: &MessageClass) -> String {
    match class.service() {
        Some(service) => format!("{} service={service}", class.kind_label()),
        None => class.kind_label().to_string(),
    }
}
