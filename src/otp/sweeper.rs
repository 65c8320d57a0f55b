//! Periodic background sweep of expired entries.
//!
//! Lazy deletion inside `verify` only touches keys that are looked up again;
//! the sweeper bounds how long abandoned codes linger. It never removes
//! entries that are only attempt-exhausted.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::otp::OtpStore;
use crate::storage::OtpStorage;

/// Handle to a running sweeper task.
///
/// Dropping the handle aborts the task. Use [`shutdown`](Self::shutdown) to
/// stop it and wait for an in-flight sweep to finish.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    fn disabled(shutdown: oneshot::Sender<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
            task: tokio::spawn(async {}),
        }
    }

    /// Signals the sweeper to stop and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }

    /// Whether the sweeper task has exited, e.g. because its store was dropped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<S: OtpStorage + 'static> OtpStore<S> {
    /// Starts sweeping expired entries every `sweep_interval` on the current
    /// tokio runtime.
    ///
    /// The task holds only a weak reference to the store and exits on the
    /// first tick after the store is dropped. A failed sweep is logged and
    /// retried on the next tick. A zero interval, or one too large to
    /// schedule, starts nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use otp_store::OtpStore;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), otp_store::OtpError> {
    /// let store = Arc::new(OtpStore::builder().build_and_init().await?);
    /// let sweeper = store.spawn_sweeper();
    ///
    /// // ... serve requests ...
    ///
    /// sweeper.shutdown().await;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let period = self.config.sweep_interval;
        let (tx, mut rx) = oneshot::channel::<()>();

        if period.is_zero() {
            tracing::warn!("Sweep interval is zero; background sweep disabled");
            return SweeperHandle::disabled(tx);
        }
        let Some(first_tick) = Instant::now().checked_add(period) else {
            tracing::warn!(
                sweep_interval_secs = period.as_secs(),
                "Sweep interval out of range; background sweep disabled"
            );
            return SweeperHandle::disabled(tx);
        };

        let store = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = ticker.tick() => {}
                }

                let Some(store) = store.upgrade() else {
                    break;
                };
                if let Err(e) = store.sweep().await {
                    tracing::warn!("Background sweep failed: {}", e);
                }
            }
            tracing::debug!("Sweeper stopped");
        });

        SweeperHandle {
            shutdown: Some(tx),
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, OtpError};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    const SWEEP: Duration = Duration::from_secs(300);

    async fn store_with_clock(clock: &Arc<AtomicU64>) -> Arc<OtpStore<crate::MemoryStorage>> {
        let clock = Arc::clone(clock);
        Arc::new(
            OtpStore::builder()
                .with_sweep_interval(SWEEP)
                .with_time_provider(move || Ok(clock.load(Ordering::SeqCst)))
                .build_and_init()
                .await
                .unwrap(),
        )
    }

    /// Lets paused time run until `condition` holds or the budget runs out.
    async fn wait_until<F, Fut>(mut condition: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..50 {
            if condition().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_entries() -> Result<(), OtpError> {
        let clock = Arc::new(AtomicU64::new(0));
        let store = store_with_clock(&clock).await;
        let _sweeper = store.spawn_sweeper();

        store.generate("a@x.com", Channel::Email).await?;
        clock.store(11 * 60 * 1000, Ordering::SeqCst);
        assert_eq!(store.stats().await?.expired, 1);

        tokio::time::sleep(SWEEP).await;
        let swept = wait_until(|| {
            let store = Arc::clone(&store);
            async move { store.stats().await.map(|s| s.total_otps == 0).unwrap_or(false) }
        })
        .await;
        assert!(swept, "expired entry should be swept on the next tick");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_does_not_run_before_first_period() -> Result<(), OtpError> {
        let clock = Arc::new(AtomicU64::new(0));
        let store = store_with_clock(&clock).await;
        let _sweeper = store.spawn_sweeper();

        store.generate("a@x.com", Channel::Email).await?;
        clock.store(11 * 60 * 1000, Ordering::SeqCst);

        tokio::time::sleep(SWEEP / 2).await;
        assert_eq!(store.stats().await?.total_otps, 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_store_dropped() {
        let clock = Arc::new(AtomicU64::new(0));
        let store = store_with_clock(&clock).await;
        let sweeper = store.spawn_sweeper();

        drop(store);
        tokio::time::sleep(SWEEP).await;
        let finished = wait_until(|| {
            let done = sweeper.is_finished();
            async move { done }
        })
        .await;
        assert!(finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_sweeper() {
        let clock = Arc::new(AtomicU64::new(0));
        let store = store_with_clock(&clock).await;
        let sweeper = store.spawn_sweeper();

        sweeper.shutdown().await;

        // Nothing sweeps after shutdown
        store.generate("a@x.com", Channel::Email).await.unwrap();
        clock.store(11 * 60 * 1000, Ordering::SeqCst);
        tokio::time::sleep(SWEEP * 2).await;
        assert_eq!(store.stats().await.unwrap().total_otps, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_interval_disables_sweep() {
        let store = Arc::new(
            OtpStore::builder()
                .with_sweep_interval(Duration::from_secs(u64::MAX))
                .build_and_init()
                .await
                .unwrap(),
        );
        let mut sweeper = store.spawn_sweeper();

        // The task must end cleanly rather than by panicking
        let joined = (&mut sweeper.task).await;
        assert!(joined.is_ok(), "sweeper task panicked: {joined:?}");

        store.generate("a@x.com", Channel::Email).await.unwrap();
        assert_eq!(store.stats().await.unwrap().total_otps, 1);
    }

    #[tokio::test]
    async fn test_zero_interval_spawns_nothing() {
        let store = Arc::new(
            OtpStore::builder()
                .with_sweep_interval(Duration::ZERO)
                .build_and_init()
                .await
                .unwrap(),
        );
        let sweeper = store.spawn_sweeper();
        sweeper.shutdown().await;
    }
}
