use serde::{Deserialize, Serialize};

/// Result of submitting a code to [`OtpStore::verify`](crate::OtpStore::verify).
///
/// Every variant is an expected business outcome; callers are expected to
/// match on all of them when shaping a user-facing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// The code matched. The entry has been consumed.
    Verified,
    /// No live entry for the key: never generated, already consumed, or
    /// already removed after expiry.
    NotFound,
    /// The entry's deadline had passed. The entry has been deleted.
    Expired,
    /// The attempt ceiling had already been reached. The entry has been
    /// deleted; the user must request a new code.
    TooManyAttempts,
    /// The code did not match. One attempt has been consumed.
    Mismatch {
        /// Attempts left before the entry is exhausted.
        remaining_attempts: u32,
    },
}

impl VerifyOutcome {
    /// Returns `true` only for [`VerifyOutcome::Verified`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// User-facing description of the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Verified => "OTP verified successfully",
            Self::NotFound => "OTP not found or expired",
            Self::Expired => "OTP has expired",
            Self::TooManyAttempts => "Too many failed attempts. Please request a new OTP.",
            Self::Mismatch { .. } => "Invalid OTP",
        }
    }

    /// Short machine-readable label, used for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::TooManyAttempts => "too_many_attempts",
            Self::Mismatch { .. } => "mismatch",
        }
    }
}

/// Result of [`OtpStore::resend_check`](crate::OtpStore::resend_check).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResendOutcome {
    /// A new code may be generated for this key.
    Allowed,
    /// The current code is too recent.
    Throttled {
        /// Whole seconds to wait, rounded up.
        wait_secs: u64,
    },
}

impl ResendOutcome {
    /// Returns `true` for [`ResendOutcome::Allowed`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// User-facing description of the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Allowed => "New OTP can be generated",
            Self::Throttled { .. } => "Please wait before requesting a new OTP",
        }
    }
}

/// Point-in-time view of the store.
///
/// `expired` counts entries whose deadline has passed but which the sweep
/// has not yet removed; it is included in `total_otps`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpStats {
    /// Entries currently held, live or not.
    #[serde(rename = "totalOTPs")]
    pub total_otps: usize,
    /// Entries past their deadline that are still held.
    pub expired: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_messages() {
        assert_eq!(VerifyOutcome::NotFound.message(), "OTP not found or expired");
        assert_eq!(
            VerifyOutcome::TooManyAttempts.message(),
            "Too many failed attempts. Please request a new OTP."
        );
        assert_eq!(
            VerifyOutcome::Mismatch { remaining_attempts: 1 }.message(),
            "Invalid OTP"
        );
        assert!(VerifyOutcome::Verified.is_success());
        assert!(!VerifyOutcome::Expired.is_success());
    }

    #[test]
    fn test_resend_outcome_helpers() {
        assert!(ResendOutcome::Allowed.is_allowed());
        let throttled = ResendOutcome::Throttled { wait_secs: 12 };
        assert!(!throttled.is_allowed());
        assert_eq!(throttled.message(), "Please wait before requesting a new OTP");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(VerifyOutcome::Mismatch { remaining_attempts: 2 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "mismatch", "remaining_attempts": 2 })
        );

        let json = serde_json::to_value(ResendOutcome::Throttled { wait_secs: 42 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "throttled", "wait_secs": 42 })
        );
    }

    #[test]
    fn test_stats_field_names() {
        let stats = OtpStats {
            total_otps: 4,
            expired: 1,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"totalOTPs":4,"expired":1}"#);
    }
}
