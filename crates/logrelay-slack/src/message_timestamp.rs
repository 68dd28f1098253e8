//! Slack message timestamps (`<seconds>.<microseconds>`) as ordered values.

use std::{fmt, str::FromStr};

use thiserror::Error;

const MICROS_PER_SECOND: u64 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// Ordered Slack message timestamp with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageTimestamp {
    unix_micros: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Reason a raw Slack `ts` value could not be parsed.
pub enum MessageTimestampError {
    #[error("message timestamp is empty")]
    Empty,
    #[error("message timestamp '{0}' is malformed")]
    Malformed(String),
}

impl MessageTimestamp {
    pub fn from_unix_micros(unix_micros: u64) -> Self {
        Self { unix_micros }
    }

    pub fn unix_micros(&self) -> u64 {
        self.unix_micros
    }
}

impl FromStr for MessageTimestamp {
    type Err = MessageTimestampError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MessageTimestampError::Empty);
        }
        let malformed = || MessageTimestampError::Malformed(trimmed.to_string());
        let (seconds_raw, fraction_raw) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if seconds_raw.is_empty()
            || !seconds_raw.bytes().all(|byte| byte.is_ascii_digit())
            || !fraction_raw.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(malformed());
        }
        let seconds = seconds_raw.parse::<u64>().map_err(|_| malformed())?;

        // Slack always emits six fractional digits; shorter values are right-padded.
        let mut fraction = fraction_raw
            .chars()
            .take(FRACTION_DIGITS)
            .collect::<String>();
        while fraction.len() < FRACTION_DIGITS {
            fraction.push('0');
        }
        let micros = fraction.parse::<u64>().map_err(|_| malformed())?;

        let unix_micros = seconds
            .checked_mul(MICROS_PER_SECOND)
            .and_then(|value| value.checked_add(micros))
            .ok_or_else(malformed)?;
        Ok(Self { unix_micros })
    }
}

impl fmt::Display for MessageTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.unix_micros / MICROS_PER_SECOND,
            self.unix_micros % MICROS_PER_SECOND
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageTimestamp, MessageTimestampError};

    #[test]
    fn unit_parse_slack_ts_preserves_microseconds() {
        let ts = "1712345678.000200"
            .parse::<MessageTimestamp>()
            .expect("valid ts");
        assert_eq!(ts.unix_micros(), 1_712_345_678_000_200);
        assert_eq!(ts.to_string(), "1712345678.000200");
    }

    #[test]
    fn unit_parse_accepts_integer_and_short_fraction() {
        assert_eq!(
            "12".parse::<MessageTimestamp>().expect("integer"),
            MessageTimestamp::from_unix_micros(12_000_000)
        );
        assert_eq!(
            "1.2".parse::<MessageTimestamp>().expect("short fraction"),
            MessageTimestamp::from_unix_micros(1_200_000)
        );
    }

    #[test]
    fn unit_parse_rejects_empty_and_malformed_values() {
        assert_eq!(
            "  ".parse::<MessageTimestamp>(),
            Err(MessageTimestampError::Empty)
        );
        assert!(matches!(
            "abc.1".parse::<MessageTimestamp>(),
            Err(MessageTimestampError::Malformed(_))
        ));
        assert!(matches!(
            ".5".parse::<MessageTimestamp>(),
            Err(MessageTimestampError::Malformed(_))
        ));
        assert!(matches!(
            "1.-5".parse::<MessageTimestamp>(),
            Err(MessageTimestampError::Malformed(_))
        ));
    }

    #[test]
    fn regression_ordering_is_numeric_not_lexicographic() {
        let earlier = "999999999.999999"
            .parse::<MessageTimestamp>()
            .expect("earlier");
        let later = "1000000000.000001"
            .parse::<MessageTimestamp>()
            .expect("later");
        assert!(earlier < later);
        assert_eq!(
            "1.1".parse::<MessageTimestamp>().expect("short"),
            "1.100000".parse::<MessageTimestamp>().expect("padded")
        );
    }
}
