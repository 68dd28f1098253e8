//! Alert watcher poll loop: fetch, classify, stage, advance the watermark.

use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use logrelay_core::{current_unix_timestamp_ms, current_unix_timestamp_us};
use logrelay_slack::{truncate_for_error, ChannelHistory, ChannelMessage, MessageTimestamp};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::event_log::JsonlEventLog;
use crate::message_classifier::{MessageClass, MessageClassifier};
use crate::service_map::ServiceFileMap;
use crate::service_tag::ServiceTag;
use crate::staging::{LogStager, StageError};

const LOGGED_TEXT_MAX_CHARS: usize = 240;

#[derive(Debug, Clone)]
/// Runtime settings for the alert watcher loop.
pub struct AlertWatcherConfig {
    pub channel_id: String,
    pub history_limit: usize,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
    pub event_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Watermark carried from one poll cycle to the next.
pub struct WatcherState {
    watermark: MessageTimestamp,
}

impl WatcherState {
    pub fn starting_at(watermark: MessageTimestamp) -> Self {
        Self { watermark }
    }

    /// Starts at the current wall-clock time so earlier history is never processed.
    pub fn starting_now() -> Self {
        Self::starting_at(MessageTimestamp::from_unix_micros(
            current_unix_timestamp_us(),
        ))
    }

    pub fn watermark(&self) -> MessageTimestamp {
        self.watermark
    }

    fn advance_to(&mut self, ts: MessageTimestamp) {
        if ts > self.watermark {
            self.watermark = ts;
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollCycleReport {
    pub fetch_failed: bool,
    pub fetched_messages: usize,
    pub skipped_seen_messages: usize,
    pub skipped_invalid_timestamps: usize,
    pub alerts: usize,
    pub log_requests: usize,
    pub unmatched: usize,
    pub staged: usize,
    pub unmapped: usize,
    pub copy_failures: usize,
}

impl PollCycleReport {
    pub fn processed_messages(&self) -> usize {
        self.alerts + self.log_requests + self.unmatched
    }

    fn has_activity(&self) -> bool {
        self.fetch_failed
            || self.processed_messages() > 0
            || self.skipped_invalid_timestamps > 0
    }
}

/// Polls one channel and stages service logs for alert and log-request messages.
pub struct AlertWatcher {
    config: AlertWatcherConfig,
    history: Arc<dyn ChannelHistory>,
    classifier: MessageClassifier,
    service_map: ServiceFileMap,
    stager: LogStager,
    event_log: Option<JsonlEventLog>,
}

impl AlertWatcher {
    pub fn new(
        config: AlertWatcherConfig,
        history: Arc<dyn ChannelHistory>,
        service_map: ServiceFileMap,
    ) -> Result<Self> {
        let classifier = MessageClassifier::new().context("failed to compile message patterns")?;
        let stager = LogStager::new(config.output_dir.clone())?;
        let event_log = config
            .event_log_path
            .clone()
            .map(JsonlEventLog::open)
            .transpose()?;
        Ok(Self {
            config,
            history,
            classifier,
            service_map,
            stager,
            event_log,
        })
    }

    /// Runs poll cycles until Ctrl-C arrives while the watcher is idle.
    pub async fn run(&self, state: WatcherState) -> WatcherState {
        self.run_until(state, async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                error!(%error, "failed to listen for ctrl-c; watcher runs until killed");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs poll cycles until `shutdown` resolves. Shutdown is only observed
    /// between cycles; a cycle in progress always completes.
    pub async fn run_until<F>(&self, mut state: WatcherState, shutdown: F) -> WatcherState
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let poll_interval_ms =
            u64::try_from(self.config.poll_interval.as_millis()).unwrap_or(u64::MAX);
        info!(
            channel = %self.config.channel_id,
            services = self.service_map.len(),
            output_dir = %self.stager.output_dir().display(),
            poll_interval_ms,
            history_limit = self.config.history_limit,
            watermark = %state.watermark(),
            "monitoring channel for alerts and log requests"
        );

        loop {
            let report = self.poll_cycle(&mut state).await;
            if report.has_activity() {
                info!(
                    fetched = report.fetched_messages,
                    processed = report.processed_messages(),
                    seen = report.skipped_seen_messages,
                    alerts = report.alerts,
                    log_requests = report.log_requests,
                    staged = report.staged,
                    unmapped = report.unmapped,
                    copy_failures = report.copy_failures,
                    invalid_ts = report.skipped_invalid_timestamps,
                    fetch_failed = report.fetch_failed,
                    watermark = %state.watermark(),
                    "alert watcher cycle"
                );
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!(watermark = %state.watermark(), "alert watcher shutdown requested");
                    return state;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Executes one fetch/classify/stage pass. Never fails: fetch errors are
    /// logged and reported, and the watermark is left untouched.
    pub async fn poll_cycle(&self, state: &mut WatcherState) -> PollCycleReport {
        let mut report = PollCycleReport::default();
        let messages = match self
            .history
            .fetch_recent_messages(&self.config.channel_id, self.config.history_limit)
            .await
        {
            Ok(messages) => messages,
            Err(error) => {
                error!(
                    channel = %self.config.channel_id,
                    error = %format!("{error:#}"),
                    "failed to fetch channel history"
                );
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched_messages = messages.len();

        let mut pending = Vec::with_capacity(messages.len());
        for message in messages {
            match message.ts.parse::<MessageTimestamp>() {
                Ok(ts) => pending.push((ts, message)),
                Err(error) => {
                    report.skipped_invalid_timestamps += 1;
                    warn!(%error, "skipping channel message without a usable timestamp");
                }
            }
        }
        // History arrives newest-first; the watermark must only move forward.
        pending.sort_by_key(|(ts, _)| *ts);

        for (ts, message) in pending {
            if ts <= state.watermark() {
                report.skipped_seen_messages += 1;
                continue;
            }
            self.process_message(ts, &message, &mut report);
            state.advance_to(ts);
        }
        report
    }

    fn process_message(
        &self,
        ts: MessageTimestamp,
        message: &ChannelMessage,
        report: &mut PollCycleReport,
    ) {
        let class = self.classifier.classify(&message.text);
        let text = truncate_for_error(&message.text, LOGGED_TEXT_MAX_CHARS);
        let author = message.user.as_deref().unwrap_or("-");
        match &class {
            MessageClass::Alert(service) => {
                report.alerts += 1;
                info!(%ts, %service, author, text = %text, "alert detected");
            }
            MessageClass::LogRequest(service) => {
                report.log_requests += 1;
                info!(%ts, %service, author, text = %text, "log request detected");
            }
            MessageClass::Unmatched => {
                report.unmatched += 1;
                debug!(%ts, "ignoring message that is neither alert nor log request");
                return;
            }
        }
        if let Some(service) = class.service() {
            self.stage_service(
                ts,
                class.kind_label(),
                service,
                message.user.as_deref(),
                report,
            );
        }
    }

    fn stage_service(
        &self,
        ts: MessageTimestamp,
        kind: &str,
        service: &ServiceTag,
        author: Option<&str>,
        report: &mut PollCycleReport,
    ) {
        let event = match self.stager.stage(&self.service_map, service) {
            Ok(staged) => {
                report.staged += 1;
                info!(
                    %service,
                    source = %staged.source_path.display(),
                    destination = %staged.staged_path.display(),
                    bytes = staged.bytes,
                    "staged service log"
                );
                json!({
                    "status": "staged",
                    "source": staged.source_path.display().to_string(),
                    "destination": staged.staged_path.display().to_string(),
                    "bytes": staged.bytes,
                })
            }
            Err(error @ StageError::Unmapped { .. }) => {
                report.unmapped += 1;
                warn!(%service, "{error}");
                json!({ "status": "unmapped", "error": error.to_string() })
            }
            Err(error @ StageError::CopyFailed { .. }) => {
                report.copy_failures += 1;
                error!(%service, "{error}");
                json!({ "status": "copy_failed", "error": error.to_string() })
            }
        };
        self.record_event(ts, kind, service, author, event);
    }

    fn record_event(
        &self,
        ts: MessageTimestamp,
        kind: &str,
        service: &ServiceTag,
        author: Option<&str>,
        mut event: serde_json::Value,
    ) {
        let Some(event_log) = &self.event_log else {
            return;
        };
        event["timestamp_unix_ms"] = json!(current_unix_timestamp_ms());
        event["message_ts"] = json!(ts.to_string());
        event["kind"] = json!(kind);
        event["service"] = json!(service);
        event["author"] = json!(author);
        if let Err(error) = event_log.append(&event) {
            warn!(
                path = %event_log.path().display(),
                error = %format!("{error:#}"),
                "failed to record staging event"
            );
        }
    }
}
