use std::{sync::Arc, time::Duration};

use httpmock::prelude::*;
use logrelay_slack::{MessageTimestamp, SlackApiClient};
use logrelay_watcher::{
    AlertWatcher, AlertWatcherConfig, ConfigProperties, ServiceFileMap, WatcherState,
};
use serde_json::json;

fn slack_client(base_url: String) -> SlackApiClient {
    SlackApiClient::new(base_url, "xoxb-test".to_string(), 2_000, 1, 1).expect("slack client")
}

#[tokio::test]
async fn integration_slack_history_drives_staging_from_properties_map() {
    let temp = tempfile::tempdir().expect("tempdir");
    let logs = temp.path().join("logs");
    std::fs::create_dir_all(&logs).expect("mkdir logs");
    std::fs::write(logs.join("sync.log"), "auth sync failed\n").expect("write");
    std::fs::write(logs.join("usernull.log"), "user null\n").expect("write");
    let properties = ConfigProperties::parse(&format!(
        "SLACK_BOT_TOKEN=xoxb-test\nCHANNEL_ID=C08TEST\nauth-service={}\nuser-service={}\n",
        logs.join("sync.log").display(),
        logs.join("usernull.log").display()
    ));
    let service_map = ServiceFileMap::from_sources(&properties, &[]).expect("service map");

    let server = MockServer::start();
    let history = server.mock(|when, then| {
        when.method(GET)
            .path("/conversations.history")
            .query_param("channel", "C08TEST")
            .query_param("limit", "10");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"ts": "1700000004.000000", "text": "random chatter"},
                {"ts": "1700000003.000000", "text": "STATUS: payments-service"},
                {"ts": "1700000002.000000", "text": "LOG REQUEST: user-service"},
                {"ts": "1700000001.000000", "text": ":rotating_light: *ALERT*: ERROR: sync failed - auth-service"},
                {"ts": "1699999999.000000", "text": "LOG REQUEST: auth-service"}
            ]
        }));
    });

    let output_dir = temp.path().join("check");
    let watcher = AlertWatcher::new(
        AlertWatcherConfig {
            channel_id: properties
                .first_of(&["SLACK_CHANNEL", "CHANNEL_ID"])
                .expect("channel")
                .to_string(),
            history_limit: 10,
            poll_interval: Duration::from_millis(10),
            output_dir: output_dir.clone(),
            event_log_path: None,
        },
        Arc::new(slack_client(server.base_url())),
        service_map,
    )
    .expect("watcher");
    let mut state = WatcherState::starting_at(
        "1700000000.000000"
            .parse::<MessageTimestamp>()
            .expect("watermark"),
    );

    let report = watcher.poll_cycle(&mut state).await;

    history.assert();
    assert_eq!(report.fetched_messages, 5);
    assert_eq!(report.skipped_seen_messages, 1);
    assert_eq!(report.alerts, 1);
    assert_eq!(report.log_requests, 2);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.staged, 2);
    assert_eq!(report.unmapped, 1);
    assert_eq!(
        std::fs::read_to_string(output_dir.join("auth-service.log")).expect("auth"),
        "auth sync failed\n"
    );
    assert_eq!(
        std::fs::read_to_string(output_dir.join("user-service.log")).expect("user"),
        "user null\n"
    );
    assert!(!output_dir.join("payments-service.log").exists());
    assert_eq!(state.watermark().to_string(), "1700000004.000000");
}

#[tokio::test]
async fn integration_slack_outage_is_absorbed_by_poll_cycle() {
    let temp = tempfile::tempdir().expect("tempdir");
    let server = MockServer::start();
    let history = server.mock(|when, then| {
        when.method(GET).path("/conversations.history");
        then.status(500).body("internal error");
    });
    let watcher = AlertWatcher::new(
        AlertWatcherConfig {
            channel_id: "C08TEST".to_string(),
            history_limit: 10,
            poll_interval: Duration::from_millis(10),
            output_dir: temp.path().join("check"),
            event_log_path: None,
        },
        Arc::new(slack_client(server.base_url())),
        ServiceFileMap::default(),
    )
    .expect("watcher");
    let mut state = WatcherState::starting_at(MessageTimestamp::from_unix_micros(1));

    let first = watcher.poll_cycle(&mut state).await;
    let second = watcher.poll_cycle(&mut state).await;

    assert!(first.fetch_failed);
    assert!(second.fetch_failed);
    assert_eq!(history.calls(), 2);
    assert_eq!(state.watermark(), MessageTimestamp::from_unix_micros(1));
}
