//! Monitoring and metrics collection for the verification code store.
//!
//! Metrics collection is optional and enabled via the `metrics` feature.
//! The store records one [`MetricEvent`] per operation into whatever
//! [`MetricsCollector`] it was built with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::OtpError;
use crate::otp::outcome::VerifyOutcome;

/// Counters tracked by the store.
#[derive(Debug, Clone, Default)]
pub struct OtpMetrics {
    /// Codes handed out by `generate`
    pub codes_generated: u64,
    /// Calls to `verify`, whatever the outcome
    pub verification_attempts: u64,
    /// Per-outcome breakdown of `verification_attempts`
    pub outcomes: OutcomeMetrics,
    /// Calls to `resend_check`
    pub resend_checks: u64,
    /// Calls to `resend_check` that reported `Throttled`
    pub resends_throttled: u64,
    /// Completed sweeps
    pub sweeps: u64,
    /// Entries removed by sweeps
    pub entries_swept: u64,
    /// Performance metrics
    pub performance: PerformanceMetrics,
}

/// Verification outcome counts.
#[derive(Debug, Clone, Default)]
pub struct OutcomeMetrics {
    pub verified: u64,
    pub not_found: u64,
    pub expired: u64,
    pub too_many_attempts: u64,
    pub mismatch: u64,
}

/// Performance timing metrics.
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    /// Average time for `generate` (microseconds)
    pub avg_generation_time_us: u64,
    /// Average time for `verify` (microseconds)
    pub avg_verification_time_us: u64,
    /// Average time for a sweep (microseconds)
    pub avg_sweep_time_us: u64,
}

/// Events recorded by the store.
#[derive(Debug, Clone)]
pub enum MetricEvent {
    /// A code was generated
    CodeGenerated {
        /// Time taken to generate and store
        duration: Duration,
    },
    /// A code was submitted for verification
    VerificationAttempt {
        /// Time taken to verify
        duration: Duration,
        /// What the store answered
        outcome: VerifyOutcome,
    },
    /// A resend check was answered
    ResendCheck {
        /// Whether the check reported `Throttled`
        throttled: bool,
    },
    /// A sweep finished
    SweepCompleted {
        /// Number of entries removed
        items_cleaned: usize,
        /// Time taken
        duration: Duration,
    },
}

/// Trait for metrics collection backends.
///
/// All methods must be thread-safe as they are called concurrently from
/// request handlers and the sweeper.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Record a metric event.
    ///
    /// This method should be fast and non-blocking as it is called on every
    /// store operation.
    async fn record_event(&self, event: MetricEvent);

    /// Get current metrics snapshot.
    async fn get_metrics(&self) -> Result<OtpMetrics, OtpError>;

    /// Reset all metrics to zero.
    async fn reset_metrics(&self) -> Result<(), OtpError>;
}

/// In-memory metrics collector built on atomic counters.
///
/// # Example
///
/// ```rust
/// use otp_store::{InMemoryMetricsCollector, MetricEvent, MetricsCollector};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), otp_store::OtpError> {
/// let collector = InMemoryMetricsCollector::new();
///
/// collector.record_event(MetricEvent::CodeGenerated {
///     duration: Duration::from_micros(40),
/// }).await;
///
/// let metrics = collector.get_metrics().await?;
/// assert_eq!(metrics.codes_generated, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMetricsCollector {
    codes_generated: AtomicU64,
    verification_attempts: AtomicU64,
    verified: AtomicU64,
    not_found: AtomicU64,
    expired: AtomicU64,
    too_many_attempts: AtomicU64,
    mismatch: AtomicU64,
    resend_checks: AtomicU64,
    resends_throttled: AtomicU64,
    sweeps: AtomicU64,
    entries_swept: AtomicU64,

    // Performance tracking
    generation_time_total: AtomicU64,
    verification_time_total: AtomicU64,
    sweep_time_total: AtomicU64,
}

impl InMemoryMetricsCollector {
    /// Create a new in-memory metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> [&AtomicU64; 14] {
        [
            &self.codes_generated,
            &self.verification_attempts,
            &self.verified,
            &self.not_found,
            &self.expired,
            &self.too_many_attempts,
            &self.mismatch,
            &self.resend_checks,
            &self.resends_throttled,
            &self.sweeps,
            &self.entries_swept,
            &self.generation_time_total,
            &self.verification_time_total,
            &self.sweep_time_total,
        ]
    }
}

fn average(total: &AtomicU64, samples: u64) -> u64 {
    if samples > 0 {
        total.load(Ordering::Relaxed) / samples
    } else {
        0
    }
}

#[async_trait]
impl MetricsCollector for InMemoryMetricsCollector {
    async fn record_event(&self, event: MetricEvent) {
        match event {
            MetricEvent::CodeGenerated { duration } => {
                self.codes_generated.fetch_add(1, Ordering::Relaxed);
                self.generation_time_total
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
            }
            MetricEvent::VerificationAttempt { duration, outcome } => {
                self.verification_attempts.fetch_add(1, Ordering::Relaxed);
                self.verification_time_total
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
                let counter = match outcome {
                    VerifyOutcome::Verified => &self.verified,
                    VerifyOutcome::NotFound => &self.not_found,
                    VerifyOutcome::Expired => &self.expired,
                    VerifyOutcome::TooManyAttempts => &self.too_many_attempts,
                    VerifyOutcome::Mismatch { .. } => &self.mismatch,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::ResendCheck { throttled } => {
                self.resend_checks.fetch_add(1, Ordering::Relaxed);
                if throttled {
                    self.resends_throttled.fetch_add(1, Ordering::Relaxed);
                }
            }
            MetricEvent::SweepCompleted {
                items_cleaned,
                duration,
            } => {
                self.sweeps.fetch_add(1, Ordering::Relaxed);
                self.entries_swept
                    .fetch_add(items_cleaned as u64, Ordering::Relaxed);
                self.sweep_time_total
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
            }
        }
    }

    async fn get_metrics(&self) -> Result<OtpMetrics, OtpError> {
        let codes_generated = self.codes_generated.load(Ordering::Relaxed);
        let verification_attempts = self.verification_attempts.load(Ordering::Relaxed);
        let sweeps = self.sweeps.load(Ordering::Relaxed);

        Ok(OtpMetrics {
            codes_generated,
            verification_attempts,
            outcomes: OutcomeMetrics {
                verified: self.verified.load(Ordering::Relaxed),
                not_found: self.not_found.load(Ordering::Relaxed),
                expired: self.expired.load(Ordering::Relaxed),
                too_many_attempts: self.too_many_attempts.load(Ordering::Relaxed),
                mismatch: self.mismatch.load(Ordering::Relaxed),
            },
            resend_checks: self.resend_checks.load(Ordering::Relaxed),
            resends_throttled: self.resends_throttled.load(Ordering::Relaxed),
            sweeps,
            entries_swept: self.entries_swept.load(Ordering::Relaxed),
            performance: PerformanceMetrics {
                avg_generation_time_us: average(&self.generation_time_total, codes_generated),
                avg_verification_time_us: average(
                    &self.verification_time_total,
                    verification_attempts,
                ),
                avg_sweep_time_us: average(&self.sweep_time_total, sweeps),
            },
        })
    }

    async fn reset_metrics(&self) -> Result<(), OtpError> {
        for counter in self.counters() {
            counter.store(0, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// No-op metrics collector that discards all metrics.
#[derive(Debug, Default)]
pub struct NoOpMetricsCollector;

impl NoOpMetricsCollector {
    /// Create a new no-op metrics collector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsCollector for NoOpMetricsCollector {
    async fn record_event(&self, _event: MetricEvent) {}

    async fn get_metrics(&self) -> Result<OtpMetrics, OtpError> {
        Ok(OtpMetrics::default())
    }

    async fn reset_metrics(&self) -> Result<(), OtpError> {
        Ok(())
    }
}
