use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::time::Instant;

use super::config::OtpConfig;
use super::outcome::{OtpStats, ResendOutcome, VerifyOutcome};
use super::record::OtpEntry;
use super::storage::{MemoryStorage, OtpStorage};
use super::time_utils;
use super::{OtpError, OtpStoreBuilder};
use crate::{Channel, VerificationKey};

#[cfg(feature = "metrics")]
use super::metrics::{MetricEvent, MetricsCollector, NoOpMetricsCollector};

/// A function that returns the current Unix time in milliseconds.
pub type TimeProviderFn = Box<dyn Fn() -> Result<u64, OtpError> + Send + Sync>;

/// A function that produces a fresh 6-digit code.
pub type CodeGeneratorFn = Box<dyn Fn() -> Result<String, OtpError> + Send + Sync>;

/// Issues and validates short-lived one-time verification codes.
///
/// The store holds at most one entry per (identifier, channel) key. It never
/// delivers codes itself: `generate` hands the code back and the caller
/// passes it to a dispatcher.
///
/// To create an instance, use the `OtpStore::builder()` method.
///
/// # Example
///
/// ```rust
/// use otp_store::{Channel, OtpStore, VerifyOutcome};
///
/// # async fn example() -> Result<(), otp_store::OtpError> {
/// let store = OtpStore::builder().build_and_init().await?;
///
/// let code = store.generate("a@example.com", Channel::Email).await?;
/// assert_eq!(
///     store.verify("a@example.com", &code, Channel::Email).await?,
///     VerifyOutcome::Verified
/// );
/// // Codes are single-use
/// assert_eq!(
///     store.verify("a@example.com", &code, Channel::Email).await?,
///     VerifyOutcome::NotFound
/// );
/// # Ok(())
/// # }
/// ```
pub struct OtpStore<S: OtpStorage> {
    pub(crate) config: OtpConfig,
    pub(crate) storage: Arc<S>,
    pub(crate) time_provider: TimeProviderFn,
    pub(crate) code_generator: CodeGeneratorFn,
    #[cfg(feature = "metrics")]
    pub(crate) metrics_collector: Arc<dyn MetricsCollector>,
}

impl OtpStore<MemoryStorage> {
    /// Creates a new `OtpStoreBuilder`.
    ///
    /// The builder defaults to `MemoryStorage`, the system clock and OS
    /// entropy. Provide a custom storage backend with `.with_storage()`.
    pub fn builder() -> OtpStoreBuilder<MemoryStorage> {
        OtpStoreBuilder::new()
    }
}

impl<S: OtpStorage + 'static> OtpStore<S> {
    /// Internal constructor used by the builder.
    #[cfg(feature = "metrics")]
    pub(crate) fn new(
        storage: Arc<S>,
        config: OtpConfig,
        time_provider: TimeProviderFn,
        code_generator: CodeGeneratorFn,
        metrics_collector: Option<Arc<dyn MetricsCollector>>,
    ) -> Self {
        let metrics_collector =
            metrics_collector.unwrap_or_else(|| Arc::new(NoOpMetricsCollector::new()));
        Self {
            config,
            storage,
            time_provider,
            code_generator,
            metrics_collector,
        }
    }

    /// Internal constructor used by the builder (non-metrics version).
    #[cfg(not(feature = "metrics"))]
    pub(crate) fn new(
        storage: Arc<S>,
        config: OtpConfig,
        time_provider: TimeProviderFn,
        code_generator: CodeGeneratorFn,
    ) -> Self {
        Self {
            config,
            storage,
            time_provider,
            code_generator,
        }
    }

    /// Initializes the storage backend.
    pub(crate) async fn init(&self) -> Result<(), OtpError> {
        self.storage.init().await
    }

    fn now(&self) -> Result<u64, OtpError> {
        (self.time_provider)()
    }

    /// Generates a fresh code for `(identifier, channel)` and stores it,
    /// replacing any outstanding code for that key.
    ///
    /// No resend throttle is applied here; callers that want one consult
    /// [`resend_check`](Self::resend_check) first.
    ///
    /// # Errors
    ///
    /// [`OtpError::EntropyUnavailable`] if no randomness could be drawn,
    /// which callers should treat as fatal. Clock and storage failures are
    /// passed through.
    pub async fn generate(&self, identifier: &str, channel: Channel) -> Result<String, OtpError> {
        #[cfg(feature = "metrics")]
        let start_time = Instant::now();

        let code = (self.code_generator)()?;
        let now_ms = self.now()?;
        let key = VerificationKey::new(identifier, channel);
        let entry = OtpEntry::new(code.clone(), now_ms, self.config.code_ttl);

        let replaced = self.storage.put(&key, entry).await?;
        tracing::debug!(
            identifier,
            %channel,
            replaced = replaced.is_some(),
            "Generated verification code"
        );

        #[cfg(feature = "metrics")]
        self.record(MetricEvent::CodeGenerated {
            duration: start_time.elapsed(),
        })
        .await;

        Ok(code)
    }

    /// Checks a submitted code against the outstanding entry for
    /// `(identifier, channel)`.
    ///
    /// Side effects per outcome:
    /// - `Verified`, `Expired`, `TooManyAttempts`: the entry is deleted
    /// - `Mismatch`: the entry's attempt count goes up by one
    /// - `NotFound`: nothing
    ///
    /// The comparison is exact; no trimming or normalization is applied.
    pub async fn verify(
        &self,
        identifier: &str,
        code: &str,
        channel: Channel,
    ) -> Result<VerifyOutcome, OtpError> {
        #[cfg(feature = "metrics")]
        let start_time = Instant::now();

        let now_ms = self.now()?;
        let key = VerificationKey::new(identifier, channel);
        let outcome = self
            .storage
            .check_and_consume(&key, code, now_ms, self.config.max_attempts)
            .await?;

        tracing::debug!(
            identifier,
            %channel,
            outcome = outcome.label(),
            "Verification attempt"
        );

        #[cfg(feature = "metrics")]
        self.record(MetricEvent::VerificationAttempt {
            duration: start_time.elapsed(),
            outcome,
        })
        .await;

        Ok(outcome)
    }

    /// Reports whether a new code may be issued for `(identifier, channel)`.
    ///
    /// Returns `Throttled` while a live entry for the key is younger than
    /// the resend interval. This is advisory: [`generate`](Self::generate)
    /// does not consult it. Never modifies the store.
    pub async fn resend_check(
        &self,
        identifier: &str,
        channel: Channel,
    ) -> Result<ResendOutcome, OtpError> {
        let now_ms = self.now()?;
        let key = VerificationKey::new(identifier, channel);

        let outcome = match self.storage.get(&key).await? {
            Some(entry) if !entry.is_expired(now_ms) => {
                match time_utils::remaining_wait_secs(
                    entry.created_at_ms,
                    now_ms,
                    self.config.resend_interval,
                ) {
                    Some(wait_secs) => ResendOutcome::Throttled { wait_secs },
                    None => ResendOutcome::Allowed,
                }
            }
            _ => ResendOutcome::Allowed,
        };

        if let ResendOutcome::Throttled { wait_secs } = outcome {
            tracing::debug!(identifier, %channel, wait_secs, "Resend throttled");
        }

        #[cfg(feature = "metrics")]
        self.record(MetricEvent::ResendCheck {
            throttled: !outcome.is_allowed(),
        })
        .await;

        Ok(outcome)
    }

    /// Removes every entry whose deadline has passed and returns how many
    /// were removed.
    ///
    /// Attempt-exhausted entries that have not yet expired are left in
    /// place; the next `verify` on their key removes them.
    pub async fn sweep(&self) -> Result<usize, OtpError> {
        #[cfg(feature = "metrics")]
        let start_time = Instant::now();

        let now_ms = self.now()?;
        let removed = self.storage.remove_expired(now_ms).await?;
        if removed > 0 {
            tracing::info!(removed, "Swept expired verification codes");
        }

        #[cfg(feature = "metrics")]
        self.record(MetricEvent::SweepCompleted {
            items_cleaned: removed,
            duration: start_time.elapsed(),
        })
        .await;

        Ok(removed)
    }

    /// Returns the number of held entries and how many of them are past
    /// their deadline but not yet swept. Never modifies the store.
    pub async fn stats(&self) -> Result<OtpStats, OtpError> {
        let now_ms = self.now()?;
        let stats = self.storage.get_stats(now_ms).await?;
        Ok(OtpStats {
            total_otps: stats.total_records,
            expired: stats.expired_records,
        })
    }

    #[cfg(feature = "metrics")]
    async fn record(&self, event: MetricEvent) {
        self.metrics_collector.record_event(event).await;
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Returns the metrics collector the store records into.
    #[cfg(feature = "metrics")]
    pub fn metrics_collector(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics_collector
    }
}
