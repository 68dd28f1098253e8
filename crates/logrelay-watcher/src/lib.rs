//! Alert watcher for logrelay.
//!
//! Polls a chat channel, classifies alert and log-request messages, and
//! stages the mapped service log file into a shared output directory.

pub mod event_log;
pub mod message_classifier;
pub mod properties;
pub mod service_map;
pub mod service_tag;
pub mod staging;
pub mod watcher_runtime;

pub use event_log::JsonlEventLog;
pub use message_classifier::{MessageClass, MessageClassifier};
pub use properties::{ConfigProperties, RESERVED_PROPERTY_KEYS};
pub use service_map::{parse_service_entry, ServiceFileMap, ServiceMapError};
pub use service_tag::{ServiceTag, ServiceTagError, UNKNOWN_SERVICE_TAG};
pub use staging::{LogStager, StageError, StagedLogFile};
pub use watcher_runtime::{AlertWatcher, AlertWatcherConfig, PollCycleReport, WatcherState};
