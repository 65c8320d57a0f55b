use std::time::Duration;

use crate::otp::outcome::VerifyOutcome;
use crate::otp::time_utils;

/// Stored state for one outstanding verification request.
///
/// An entry is created by `generate`, mutated only by failed verification
/// attempts, and replaced wholesale by the next `generate` for the same key.
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    /// The 6-digit code, zero-padded.
    pub code: String,
    /// When the entry was (re)generated; drives resend throttling.
    pub created_at_ms: u64,
    /// Absolute deadline after which the code is no longer accepted.
    pub expires_at_ms: u64,
    /// Failed verification attempts against this entry.
    pub attempts: u32,
}

/// What a storage backend must do with an entry after a verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Remove the entry from storage.
    Delete,
    /// Persist the entry with its attempt counter incremented.
    RecordFailedAttempt,
}

impl OtpEntry {
    /// Creates a fresh entry with zero attempts.
    pub fn new(code: String, now_ms: u64, ttl: Duration) -> Self {
        Self {
            code,
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(time_utils::duration_millis(ttl)),
            attempts: 0,
        }
    }

    /// Whether `now_ms` is past the entry's deadline.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        time_utils::is_past(self.expires_at_ms, now_ms)
    }

    /// Whether the attempt ceiling has been reached.
    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    /// Decides the outcome of submitting `submitted` at `now_ms`, and the
    /// storage action that must accompany it.
    ///
    /// Expiry is checked before the attempt ceiling, which is checked before
    /// the code itself, so an exhausted entry is rejected even when the
    /// correct code is submitted. Backends apply the returned action under
    /// the same lock that produced the entry.
    pub fn evaluate(
        &self,
        submitted: &str,
        now_ms: u64,
        max_attempts: u32,
    ) -> (VerifyOutcome, EntryAction) {
        if self.is_expired(now_ms) {
            return (VerifyOutcome::Expired, EntryAction::Delete);
        }
        if self.is_exhausted(max_attempts) {
            return (VerifyOutcome::TooManyAttempts, EntryAction::Delete);
        }
        if self.code != submitted {
            let remaining_attempts = max_attempts.saturating_sub(self.attempts + 1);
            return (
                VerifyOutcome::Mismatch { remaining_attempts },
                EntryAction::RecordFailedAttempt,
            );
        }
        (VerifyOutcome::Verified, EntryAction::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(600);

    fn entry(code: &str) -> OtpEntry {
        OtpEntry::new(code.to_string(), 1_000, TTL)
    }

    #[test]
    fn test_new_entry_deadline() {
        let entry = entry("123456");
        assert_eq!(entry.created_at_ms, 1_000);
        assert_eq!(entry.expires_at_ms, 601_000);
        assert_eq!(entry.attempts, 0);
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = entry("123456");
        assert!(!entry.is_expired(601_000));
        assert!(entry.is_expired(601_001));
    }

    #[test]
    fn test_matching_code_verifies() {
        assert_eq!(
            entry("123456").evaluate("123456", 2_000, 3),
            (VerifyOutcome::Verified, EntryAction::Delete)
        );
    }

    #[test]
    fn test_mismatch_reports_remaining_after_increment() {
        let mut entry = entry("123456");
        assert_eq!(
            entry.evaluate("000000", 2_000, 3),
            (
                VerifyOutcome::Mismatch { remaining_attempts: 2 },
                EntryAction::RecordFailedAttempt
            )
        );
        entry.attempts = 2;
        assert_eq!(
            entry.evaluate("000000", 2_000, 3).0,
            VerifyOutcome::Mismatch { remaining_attempts: 0 }
        );
    }

    #[test]
    fn test_expired_wins_over_correct_code() {
        assert_eq!(
            entry("123456").evaluate("123456", 601_001, 3),
            (VerifyOutcome::Expired, EntryAction::Delete)
        );
    }

    #[test]
    fn test_exhausted_rejects_correct_code() {
        let mut entry = entry("123456");
        entry.attempts = 3;
        assert_eq!(
            entry.evaluate("123456", 2_000, 3),
            (VerifyOutcome::TooManyAttempts, EntryAction::Delete)
        );
    }

    #[test]
    fn test_expiry_checked_before_exhaustion() {
        let mut entry = entry("123456");
        entry.attempts = 3;
        assert_eq!(entry.evaluate("000000", 700_000, 3).0, VerifyOutcome::Expired);
    }

    #[test]
    fn test_comparison_is_exact() {
        let entry = entry("012345");
        assert!(matches!(
            entry.evaluate("12345", 2_000, 3).0,
            VerifyOutcome::Mismatch { .. }
        ));
        assert!(matches!(
            entry.evaluate(" 012345", 2_000, 3).0,
            VerifyOutcome::Mismatch { .. }
        ));
    }
}
