//! Time utilities for safe timestamp handling.
//!
//! All store timestamps are Unix milliseconds. These helpers avoid the
//! panicking `SystemTime` paths and keep the expiry and throttle arithmetic
//! in one place.

use crate::otp::error::OtpError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current timestamp in milliseconds since Unix epoch.
///
/// In the extremely rare case where system time is before Unix epoch,
/// it returns an error instead of panicking.
pub(crate) fn current_timestamp_millis() -> Result<u64, OtpError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|_| OtpError::Clock("System time is before Unix epoch".to_string()))
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A deadline has passed only once `now` is strictly later than it.
pub(crate) fn is_past(deadline_ms: u64, now_ms: u64) -> bool {
    now_ms > deadline_ms
}

/// Remaining whole seconds (rounded up) before `interval` has elapsed since
/// `since_ms`, or `None` if it already has.
pub(crate) fn remaining_wait_secs(since_ms: u64, now_ms: u64, interval: Duration) -> Option<u64> {
    let elapsed = now_ms.saturating_sub(since_ms);
    let interval_ms = duration_millis(interval);
    if elapsed >= interval_ms {
        return None;
    }
    Some((interval_ms - elapsed).div_ceil(1000))
}
