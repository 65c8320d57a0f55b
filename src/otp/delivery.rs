//! Handing generated codes to an out-of-band transport.
//!
//! The store never sends anything. A [`CodeDispatcher`] delivers a code to
//! an email address or phone number, and [`issue_code`] strings the
//! resend check, generation and dispatch together the way a registration
//! or recovery flow is expected to.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Channel;
use crate::otp::outcome::ResendOutcome;
use crate::otp::{OtpError, OtpStore};
use crate::storage::OtpStorage;

/// Proof that a dispatcher accepted a code for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Channel the code went out on
    pub channel: Channel,
    /// Transport-specific message id, if the transport returns one
    pub message_id: Option<String>,
}

/// A transport that can deliver a verification code.
///
/// Implementations wrap an SMTP client, an SMS gateway and so on. Failures
/// are reported as [`OtpError::Delivery`]; they never affect the stored code.
#[async_trait]
pub trait CodeDispatcher: Send + Sync {
    /// Delivers `code` to `destination` over `channel`.
    async fn dispatch(
        &self,
        destination: &str,
        channel: Channel,
        code: &str,
    ) -> Result<DeliveryReceipt, OtpError>;
}

/// Development dispatcher that logs the rendered message instead of sending it.
///
/// The message carries the plaintext code, so it is logged at `debug` level
/// only. Do not enable that level for this crate in production.
#[derive(Debug, Clone)]
pub struct TracingDispatcher {
    code_ttl: Duration,
}

impl TracingDispatcher {
    /// Creates a dispatcher whose messages advertise `code_ttl` as the
    /// validity period.
    pub fn new(code_ttl: Duration) -> Self {
        Self { code_ttl }
    }
}

impl Default for TracingDispatcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

#[async_trait]
impl CodeDispatcher for TracingDispatcher {
    async fn dispatch(
        &self,
        destination: &str,
        channel: Channel,
        code: &str,
    ) -> Result<DeliveryReceipt, OtpError> {
        let body = render_message(channel, code, self.code_ttl);
        tracing::debug!(destination, %channel, "{}", body);
        Ok(DeliveryReceipt {
            channel,
            message_id: None,
        })
    }
}

/// Renders the text sent to the user for `channel`.
///
/// # Example
///
/// ```rust
/// use otp_store::{Channel, render_message};
/// use std::time::Duration;
///
/// assert_eq!(
///     render_message(Channel::Sms, "042917", Duration::from_secs(600)),
///     "Your verification code is: 042917. Valid for 10 minutes. Do not share this code."
/// );
/// ```
pub fn render_message(channel: Channel, code: &str, ttl: Duration) -> String {
    let validity = describe_validity(ttl);
    match channel {
        Channel::Sms => format!(
            "Your verification code is: {code}. Valid for {validity}. Do not share this code."
        ),
        Channel::Email => format!(
            "Please use the following code to verify your email address: {code}\n\n\
             This code will expire in {validity}.\n\
             If you didn't request this verification, please ignore this email."
        ),
    }
}

fn describe_validity(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{minutes} minutes"),
        _ => format!("{secs} seconds"),
    }
}

/// Result of [`issue_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// A fresh code was stored and accepted by the dispatcher.
    Sent(DeliveryReceipt),
    /// The previous code is too recent; nothing was generated.
    Throttled {
        /// Whole seconds to wait, rounded up.
        wait_secs: u64,
    },
    /// A fresh code was stored but the dispatcher failed. The code remains
    /// valid, so the user may still receive and submit it; offer a resend.
    DeliveryFailed {
        /// Why the dispatcher failed
        reason: String,
    },
}

/// Issues a code for `(identifier, channel)` and dispatches it, honoring
/// the resend throttle.
///
/// The identifier doubles as the delivery destination. Store failures are
/// returned as errors; dispatcher failures become
/// [`IssueOutcome::DeliveryFailed`].
///
/// # Example
///
/// ```rust
/// use otp_store::{Channel, IssueOutcome, OtpStore, TracingDispatcher, issue_code};
///
/// # async fn example() -> Result<(), otp_store::OtpError> {
/// let store = OtpStore::builder().build_and_init().await?;
/// let dispatcher = TracingDispatcher::default();
///
/// let first = issue_code(&store, &dispatcher, "a@example.com", Channel::Email).await?;
/// assert!(matches!(first, IssueOutcome::Sent(_)));
///
/// let again = issue_code(&store, &dispatcher, "a@example.com", Channel::Email).await?;
/// assert!(matches!(again, IssueOutcome::Throttled { .. }));
/// # Ok(())
/// # }
/// ```
pub async fn issue_code<S, D>(
    store: &OtpStore<S>,
    dispatcher: &D,
    identifier: &str,
    channel: Channel,
) -> Result<IssueOutcome, OtpError>
where
    S: OtpStorage + 'static,
    D: CodeDispatcher + ?Sized,
{
    if let ResendOutcome::Throttled { wait_secs } = store.resend_check(identifier, channel).await? {
        return Ok(IssueOutcome::Throttled { wait_secs });
    }

    let code = store.generate(identifier, channel).await?;
    match dispatcher.dispatch(identifier, channel, &code).await {
        Ok(receipt) => Ok(IssueOutcome::Sent(receipt)),
        Err(e) => {
            tracing::warn!(identifier, %channel, "Code dispatch failed: {}", e);
            Ok(IssueOutcome::DeliveryFailed {
                reason: e.to_string(),
            })
        }
    }
}
