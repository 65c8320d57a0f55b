//! # OTP Store
//!
//! Short-lived one-time verification codes for confirming possession of an
//! email address or phone number during registration and account recovery.
//!
//! The crate owns the code lifecycle only: generation, time-bounded storage,
//! attempt-limited verification and resend throttling, plus a background
//! sweep of expired codes. Delivering the code is left to a
//! [`CodeDispatcher`]; request handling, user records and so on belong to
//! the hosting application.
//!
//! ## Features
//!
//! - **Uniform 6-digit codes**: drawn from OS entropy, `000000` to `999999`
//! - **Single-use**: a verified code is deleted and cannot be replayed
//! - **Attempt ceiling**: three wrong submissions kill a code
//! - **Expiry**: codes are valid for ten minutes, removed lazily and by a periodic sweep
//! - **Resend throttle**: advisory 60-second gate between codes for the same key
//! - **Injectable clock and randomness**: deterministic tests of time-based behavior
//! - **Optional metrics**: enable the `metrics` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use otp_store::{Channel, OtpStore, ResendOutcome, VerifyOutcome};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), otp_store::OtpError> {
//! let store = Arc::new(OtpStore::builder().build_and_init().await?);
//! let _sweeper = store.spawn_sweeper();
//!
//! let code = store.generate("a@example.com", Channel::Email).await?;
//! // ... hand `code` to a dispatcher ...
//!
//! assert!(matches!(
//!     store.resend_check("a@example.com", Channel::Email).await?,
//!     ResendOutcome::Throttled { .. }
//! ));
//!
//! match store.verify("a@example.com", "000000", Channel::Email).await? {
//!     VerifyOutcome::Verified => println!("verified"),
//!     VerifyOutcome::Mismatch { remaining_attempts } => {
//!         println!("wrong code, {remaining_attempts} attempts left")
//!     }
//!     other => println!("{}", other.message()),
//! }
//! # let _ = code;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Defaults can be overridden per field on the builder, with a
//! [`ConfigPreset`], or from the environment:
//!
//! ```bash
//! export OTP_STORE_CODE_TTL=600
//! export OTP_STORE_MAX_ATTEMPTS=3
//! export OTP_STORE_RESEND_INTERVAL=60
//! export OTP_STORE_SWEEP_INTERVAL=300
//! ```
//!
//! ## Architecture
//!
//! - **[`OtpStore`]**: the four operations plus the sweep
//! - **[`OtpStorage`]**: storage seam; [`MemoryStorage`] is the shipped backend
//! - **[`VerifyOutcome`] / [`ResendOutcome`]**: every business result is a value
//! - **[`OtpError`]**: infrastructure failures only

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod otp;

// Re-export commonly used types
pub use otp::storage;
pub use otp::{
    CODE_LENGTH, CodeDispatcher, CodeGeneratorFn, ConfigPreset, DeliveryReceipt, EntryAction,
    IssueOutcome, MemoryStorage, OtpConfig, OtpEntry, OtpError, OtpStats, OtpStorage, OtpStore,
    OtpStoreBuilder, ResendOutcome, StorageStats, SweeperHandle, TimeProviderFn,
    TracingDispatcher, VerifyOutcome, generate_code, generate_code_with, issue_code,
    render_message,
};

#[cfg(feature = "metrics")]
pub use otp::{
    InMemoryMetricsCollector, MetricEvent, MetricsCollector, NoOpMetricsCollector, OtpMetrics,
};

/// Delivery medium a code is issued for.
///
/// The same identifier under two channels holds two independent codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Code sent to an email address.
    Email,
    /// Code sent by text message to a phone number.
    Sms,
}

impl Channel {
    /// Lowercase name, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            other => Err(OtpError::InvalidChannel(other.to_string())),
        }
    }
}

/// Identifies the single outstanding code for an identifier on a channel.
///
/// The identifier (email address or phone number) is used verbatim; any
/// normalization is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationKey {
    /// Email address or phone number
    pub identifier: String,
    /// Channel the code is issued for
    pub channel: Channel,
}

impl VerificationKey {
    /// Creates a key for `identifier` on `channel`.
    pub fn new(identifier: impl Into<String>, channel: Channel) -> Self {
        Self {
            identifier: identifier.into(),
            channel,
        }
    }
}

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.identifier)
    }
}
