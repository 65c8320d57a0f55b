use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::otp::metrics::MetricsCollector;
use crate::otp::store::{CodeGeneratorFn, TimeProviderFn};
use crate::otp::{OtpConfig, OtpError, OtpStore, code, time_utils};
use crate::storage::{MemoryStorage, OtpStorage};

/// A builder for creating an `OtpStore` instance.
///
/// This builder defaults to `MemoryStorage`, [`OtpConfig::default`], the
/// system clock and OS entropy.
#[must_use = "The builder does nothing unless `.build_and_init()` is called."]
pub struct OtpStoreBuilder<S: OtpStorage> {
    storage: Arc<S>,
    config: OtpConfig,
    time_provider: Option<TimeProviderFn>,
    code_generator: Option<CodeGeneratorFn>,
    #[cfg(feature = "metrics")]
    metrics_collector: Option<Arc<dyn MetricsCollector>>,
}

impl OtpStoreBuilder<MemoryStorage> {
    /// Creates a new builder.
    pub(crate) fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            config: OtpConfig::default(),
            time_provider: None,
            code_generator: None,
            #[cfg(feature = "metrics")]
            metrics_collector: None,
        }
    }
}

impl<S: OtpStorage + 'static> OtpStoreBuilder<S> {
    /// Specifies a custom storage backend to use instead of the default `MemoryStorage`.
    pub fn with_storage<T: OtpStorage + 'static>(self, storage: Arc<T>) -> OtpStoreBuilder<T> {
        OtpStoreBuilder {
            storage,
            config: self.config,
            time_provider: self.time_provider,
            code_generator: self.code_generator,
            #[cfg(feature = "metrics")]
            metrics_collector: self.metrics_collector,
        }
    }

    /// Replaces the whole configuration, e.g. with a [`ConfigPreset`](crate::ConfigPreset).
    ///
    /// # Example
    ///
    /// ```rust
    /// use otp_store::{ConfigPreset, OtpStore};
    ///
    /// # async fn example() -> Result<(), otp_store::OtpError> {
    /// let store = OtpStore::builder()
    ///     .with_config(ConfigPreset::HighSecurity.into())
    ///     .build_and_init()
    ///     .await?;
    /// assert_eq!(store.config().resend_interval.as_secs(), 120);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(mut self, config: OtpConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how long a generated code stays valid.
    ///
    /// If not set, defaults to 10 minutes.
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.config.code_ttl = ttl;
        self
    }

    /// Sets how many wrong submissions a code tolerates.
    ///
    /// If not set, defaults to 3.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Sets the interval reported by `resend_check`.
    ///
    /// If not set, defaults to 1 minute.
    pub fn with_resend_interval(mut self, interval: Duration) -> Self {
        self.config.resend_interval = interval;
        self
    }

    /// Sets the period of the background sweep started by `spawn_sweeper`.
    ///
    /// If not set, defaults to 5 minutes.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Sets a custom clock returning Unix milliseconds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use otp_store::OtpStore;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// # async fn example() -> Result<(), otp_store::OtpError> {
    /// let clock = Arc::new(AtomicU64::new(0));
    /// let handle = Arc::clone(&clock);
    /// let store = OtpStore::builder()
    ///     .with_time_provider(move || Ok(handle.load(Ordering::SeqCst)))
    ///     .build_and_init()
    ///     .await?;
    ///
    /// // Advance simulated time by a minute
    /// clock.fetch_add(60_000, Ordering::SeqCst);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_time_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Result<u64, OtpError> + Send + Sync + 'static,
    {
        self.time_provider = Some(Box::new(provider));
        self
    }

    /// Sets a custom code source.
    ///
    /// The default draws uniformly from OS entropy; a replacement must keep
    /// codes unpredictable outside of tests.
    pub fn with_code_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Result<String, OtpError> + Send + Sync + 'static,
    {
        self.code_generator = Some(Box::new(generator));
        self
    }

    /// Sets the collector that store operations are recorded into.
    ///
    /// If not set, metrics are discarded.
    #[cfg(feature = "metrics")]
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics_collector = Some(collector);
        self
    }

    /// Builds and initializes the `OtpStore`.
    ///
    /// Configuration warnings from [`OtpConfig::validate`] are logged, not
    /// rejected. The storage backend's `init()` is called before returning.
    pub async fn build_and_init(self) -> Result<OtpStore<S>, OtpError> {
        for warning in self.config.validate() {
            tracing::warn!("{}", warning);
        }

        let time_provider = self
            .time_provider
            .unwrap_or_else(|| Box::new(time_utils::current_timestamp_millis));
        let code_generator = self
            .code_generator
            .unwrap_or_else(|| Box::new(code::generate_code));

        #[cfg(feature = "metrics")]
        let store = OtpStore::new(
            self.storage,
            self.config,
            time_provider,
            code_generator,
            self.metrics_collector,
        );
        #[cfg(not(feature = "metrics"))]
        let store = OtpStore::new(self.storage, self.config, time_provider, code_generator);

        store.init().await?;
        Ok(store)
    }
}
