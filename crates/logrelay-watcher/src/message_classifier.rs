//! Pattern matching that turns channel message text into watcher actions.

use regex::Regex;

use crate::service_tag::ServiceTag;

const ALERT_PATTERN: &str = r"(?i):rotating_light:\s+(?:\*?ALERT\*?:\s+)?ERROR:.*?-.*";
const ALERT_SERVICE_PATTERN: &str = r"-\s*([a-zA-Z0-9_-]+)\s*$";
const LOG_REQUEST_PATTERN: &str = r"(?i)(LOG REQUEST|SHOW LOG|STATUS):\s*([a-zA-Z0-9_-]+)";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of classifying one message.
pub enum MessageClass {
    Alert(ServiceTag),
    LogRequest(ServiceTag),
    Unmatched,
}

impl MessageClass {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Alert(_) => "alert",
            Self::LogRequest(_) => "log_request",
            Self::Unmatched => "unmatched",
        }
    }

    pub fn service(&self) -> Option<&ServiceTag> {
        match self {
            Self::Alert(tag) | Self::LogRequest(tag) => Some(tag),
            Self::Unmatched => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Compiled alert and log-request patterns.
pub struct MessageClassifier {
    alert: Regex,
    alert_service: Regex,
    log_request: Regex,
}

impl MessageClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            alert: Regex::new(ALERT_PATTERN)?,
            alert_service: Regex::new(ALERT_SERVICE_PATTERN)?,
            log_request: Regex::new(LOG_REQUEST_PATTERN)?,
        })
    }

    /// Alert shape is checked first, so a message matching both shapes is an alert.
    pub fn classify(&self, text: &str) -> MessageClass {
        if self.alert.is_match(text) {
            let service = self
                .alert_service
                .captures(text)
                .and_then(|captures| captures.get(1))
                .and_then(|token| ServiceTag::parse(token.as_str()).ok())
                .unwrap_or_else(ServiceTag::unknown);
            return MessageClass::Alert(service);
        }

        self.log_request
            .captures(text)
            .and_then(|captures| captures.get(2))
            .and_then(|token| ServiceTag::parse(token.as_str()).ok())
            .map_or(MessageClass::Unmatched, MessageClass::LogRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageClass, MessageClassifier};
    use crate::service_tag::ServiceTag;

    fn classifier() -> MessageClassifier {
        MessageClassifier::new().expect("patterns compile")
    }

    fn tag(raw: &str) -> ServiceTag {
        ServiceTag::parse(raw).expect("tag")
    }

    #[test]
    fn unit_alert_extracts_trailing_service_tag() {
        assert_eq!(
            classifier().classify(":rotating_light: ALERT: ERROR: database down - auth-service"),
            MessageClass::Alert(tag("auth-service"))
        );
    }

    #[test]
    fn unit_alert_accepts_bold_label_and_any_case() {
        assert_eq!(
            classifier().classify(":rotating_light: *ALERT*: error: Null pointer in handler - user-service  "),
            MessageClass::Alert(tag("user-service"))
        );
        assert_eq!(
            classifier().classify(":ROTATING_LIGHT:   alert: ERROR: sync failed -demo-app-service"),
            MessageClass::Alert(tag("demo-app-service"))
        );
    }

    #[test]
    fn unit_alert_label_is_optional() {
        assert_eq!(
            classifier().classify(":rotating_light: ERROR: database down - auth-service"),
            MessageClass::Alert(tag("auth-service"))
        );
        assert_eq!(
            classifier().classify(":rotating_light: ERROR: LOG REQUEST: x - user-service"),
            MessageClass::Alert(tag("user-service"))
        );
    }

    #[test]
    fn unit_alert_tag_skips_hyphens_inside_message_body() {
        assert_eq!(
            classifier().classify(":rotating_light: ALERT: ERROR: re-try of job x-7 failed - billing_v2"),
            MessageClass::Alert(tag("billing_v2"))
        );
    }

    #[test]
    fn regression_alert_without_trailing_token_reports_unknown_service() {
        assert_eq!(
            classifier().classify(":rotating_light: ALERT: ERROR: disk - full!"),
            MessageClass::Alert(ServiceTag::unknown())
        );
    }

    #[test]
    fn unit_log_request_shapes_capture_service_tag() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("LOG REQUEST: user-service"),
            MessageClass::LogRequest(tag("user-service"))
        );
        assert_eq!(
            classifier.classify("please show log:auth-service thanks"),
            MessageClass::LogRequest(tag("auth-service"))
        );
        assert_eq!(
            classifier.classify("Status:   demo-app-service"),
            MessageClass::LogRequest(tag("demo-app-service"))
        );
    }

    #[test]
    fn functional_alert_wins_when_both_shapes_match() {
        assert_eq!(
            classifier().classify(":rotating_light: ALERT: ERROR: STATUS: degraded - auth-service"),
            MessageClass::Alert(tag("auth-service"))
        );
    }

    #[test]
    fn unit_other_text_is_unmatched() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("deploy finished - auth-service"),
            MessageClass::Unmatched
        );
        assert_eq!(
            classifier.classify(":rotating_light: ALERT: WARNING: disk - auth"),
            MessageClass::Unmatched
        );
        assert_eq!(classifier.classify("LOG REQUEST: "), MessageClass::Unmatched);
        assert_eq!(classifier.classify(""), MessageClass::Unmatched);
    }

    #[test]
    fn unit_kind_label_and_service_accessors() {
        let alert = MessageClass::Alert(tag("auth-service"));
        assert_eq!(alert.kind_label(), "alert");
        assert_eq!(alert.service().map(ServiceTag::as_str), Some("auth-service"));
        assert_eq!(MessageClass::Unmatched.kind_label(), "unmatched");
        assert_eq!(MessageClass::Unmatched.service(), None);
    }
}
