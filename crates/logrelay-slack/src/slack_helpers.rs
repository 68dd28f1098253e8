use std::time::Duration;

/// Upper bound for a server-provided `Retry-After`, in seconds.
const MAX_RETRY_AFTER_SECONDS: u64 = 60;
const MAX_BACKOFF_DOUBLINGS: u32 = 4;

/// Reads a whole-second `Retry-After` header, capped at one minute.
pub(crate) fn retry_after_seconds(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let seconds = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(seconds.min(MAX_RETRY_AFTER_SECONDS))
}

/// Delay before attempt `attempt + 1`. A server hint wins over doubling backoff.
pub(crate) fn backoff_delay(
    base_delay_ms: u64,
    attempt: usize,
    retry_after_seconds: Option<u64>,
) -> Duration {
    if let Some(seconds) = retry_after_seconds {
        return Duration::from_secs(seconds);
    }
    let doublings = u32::try_from(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX)
        .min(MAX_BACKOFF_DOUBLINGS);
    Duration::from_millis(base_delay_ms.max(1).saturating_mul(1_u64 << doublings))
}

/// Rate limits and server errors are retried while attempts remain.
pub(crate) fn status_allows_retry(attempt: usize, max_attempts: usize, status: u16) -> bool {
    attempt < max_attempts && (status == 429 || (500..600).contains(&status))
}

pub(crate) fn transport_allows_retry(
    attempt: usize,
    max_attempts: usize,
    error: &reqwest::Error,
) -> bool {
    attempt < max_attempts
        && (error.is_timeout() || error.is_connect() || error.is_request() || error.is_body())
}

/// Truncates `value` to `max_chars` characters, appending `...` when cut.
pub fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
