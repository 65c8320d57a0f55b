//! In-memory storage backend implementation.
//!
//! Entries live in a `HashMap` behind a single `tokio::sync::RwLock`. Every
//! mutating operation takes the write lock, so `generate`, verification and
//! the sweep are mutually exclusive; reads share the lock. Nothing survives
//! a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{OtpStorage, StorageStats};
use crate::otp::outcome::VerifyOutcome;
use crate::otp::record::{EntryAction, OtpEntry};
use crate::{OtpError, VerificationKey};

/// Process-local storage for verification entries.
///
/// # Example
///
/// ```rust
/// use otp_store::storage::{MemoryStorage, OtpStorage};
/// use otp_store::{Channel, OtpEntry, VerificationKey};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), otp_store::OtpError> {
/// let storage = MemoryStorage::new();
/// let key = VerificationKey::new("a@example.com", Channel::Email);
///
/// storage
///     .put(&key, OtpEntry::new("123456".to_string(), 0, Duration::from_secs(600)))
///     .await?;
/// assert!(storage.get(&key).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<VerificationKey, OtpEntry>>>,
}

impl MemoryStorage {
    /// Creates a new in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage instance with room for `capacity` entries before
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::with_capacity(capacity))),
        }
    }
}

#[async_trait]
impl OtpStorage for MemoryStorage {
    async fn put(
        &self,
        key: &VerificationKey,
        entry: OtpEntry,
    ) -> Result<Option<OtpEntry>, OtpError> {
        let mut data = self.data.write().await;
        Ok(data.insert(key.clone(), entry))
    }

    async fn get(&self, key: &VerificationKey) -> Result<Option<OtpEntry>, OtpError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn check_and_consume(
        &self,
        key: &VerificationKey,
        code: &str,
        now_ms: u64,
        max_attempts: u32,
    ) -> Result<VerifyOutcome, OtpError> {
        let mut data = self.data.write().await;
        let Some(entry) = data.get_mut(key) else {
            return Ok(VerifyOutcome::NotFound);
        };

        let (outcome, action) = entry.evaluate(code, now_ms, max_attempts);
        match action {
            EntryAction::Delete => {
                data.remove(key);
            }
            EntryAction::RecordFailedAttempt => {
                entry.attempts = entry.attempts.saturating_add(1);
            }
        }
        Ok(outcome)
    }

    async fn remove_expired(&self, now_ms: u64) -> Result<usize, OtpError> {
        let mut data = self.data.write().await;
        let initial_count = data.len();
        data.retain(|_, entry| !entry.is_expired(now_ms));
        Ok(initial_count - data.len())
    }

    async fn get_stats(&self, now_ms: u64) -> Result<StorageStats, OtpError> {
        let data = self.data.read().await;
        let expired_records = data.values().filter(|e| e.is_expired(now_ms)).count();
        let memory_usage = data.len() * std::mem::size_of::<(VerificationKey, OtpEntry)>();
        Ok(StorageStats {
            total_records: data.len(),
            expired_records,
            backend_info: format!("In-memory HashMap storage (~{memory_usage} bytes)"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(600);

    fn key(identifier: &str) -> VerificationKey {
        VerificationKey::new(identifier, Channel::Email)
    }

    fn entry(code: &str, now_ms: u64) -> OtpEntry {
        OtpEntry::new(code.to_string(), now_ms, TTL)
    }

    #[tokio::test]
    async fn test_put_replaces_previous_entry() -> Result<(), OtpError> {
        let storage = MemoryStorage::new();

        assert!(storage.put(&key("a"), entry("111111", 0)).await?.is_none());
        let previous = storage.put(&key("a"), entry("222222", 10)).await?;
        assert_eq!(previous.map(|e| e.code), Some("111111".to_string()));

        let current = storage.get(&key("a")).await?.unwrap();
        assert_eq!(current.code, "222222");
        assert_eq!(current.created_at_ms, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_channel_isolation() -> Result<(), OtpError> {
        let storage = MemoryStorage::new();
        let email = VerificationKey::new("5550100", Channel::Email);
        let sms = VerificationKey::new("5550100", Channel::Sms);

        storage.put(&sms, entry("123456", 0)).await?;
        assert!(storage.get(&email).await?.is_none());
        assert_eq!(
            storage.check_and_consume(&email, "123456", 1, 3).await?,
            VerifyOutcome::NotFound
        );
        assert_eq!(
            storage.check_and_consume(&sms, "123456", 1, 3).await?,
            VerifyOutcome::Verified
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_attempts_are_persisted() -> Result<(), OtpError> {
        let storage = MemoryStorage::new();
        storage.put(&key("a"), entry("123456", 0)).await?;

        storage.check_and_consume(&key("a"), "000000", 1, 3).await?;
        storage.check_and_consume(&key("a"), "000000", 2, 3).await?;

        assert_eq!(storage.get(&key("a")).await?.unwrap().attempts, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_outcomes_delete() -> Result<(), OtpError> {
        let storage = MemoryStorage::new();

        storage.put(&key("expired"), entry("123456", 0)).await?;
        assert_eq!(
            storage
                .check_and_consume(&key("expired"), "123456", 600_001, 3)
                .await?,
            VerifyOutcome::Expired
        );
        assert!(storage.get(&key("expired")).await?.is_none());

        let mut exhausted = entry("123456", 0);
        exhausted.attempts = 3;
        storage.put(&key("exhausted"), exhausted).await?;
        assert_eq!(
            storage
                .check_and_consume(&key("exhausted"), "123456", 1, 3)
                .await?,
            VerifyOutcome::TooManyAttempts
        );
        assert!(storage.get(&key("exhausted")).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_expired_keeps_exhausted_entries() -> Result<(), OtpError> {
        let storage = MemoryStorage::new();

        storage.put(&key("old"), entry("111111", 0)).await?;
        let mut exhausted = entry("222222", 500_000);
        exhausted.attempts = 3;
        storage.put(&key("dead"), exhausted).await?;
        storage.put(&key("fresh"), entry("333333", 500_000)).await?;

        let removed = storage.remove_expired(700_000).await?;
        assert_eq!(removed, 1);
        assert!(storage.get(&key("old")).await?.is_none());
        assert!(storage.get(&key("dead")).await?.is_some());
        assert!(storage.get(&key("fresh")).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_storage_stats() -> Result<(), OtpError> {
        let storage = MemoryStorage::with_capacity(8);

        let stats = storage.get_stats(0).await?;
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.expired_records, 0);
        assert!(stats.backend_info.contains("In-memory"));

        storage.put(&key("a"), entry("111111", 0)).await?;
        storage.put(&key("b"), entry("222222", 300_000)).await?;

        let stats = storage.get_stats(700_000).await?;
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.expired_records, 1);
        assert!(stats.backend_info.contains("bytes"));

        // Stats never remove anything
        assert_eq!(storage.get_stats(700_000).await?.total_records, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_storage_concurrent_mismatches() -> Result<(), OtpError> {
        let storage = Arc::new(MemoryStorage::new());
        storage.put(&key("a"), entry("123456", 0)).await?;

        let mut handles = vec![];
        for _ in 0..10 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage.check_and_consume(&key("a"), "000000", 1, 3).await
            }));
        }

        let mut mismatches = 0;
        let mut too_many = 0;
        let mut not_found = 0;
        for handle in handles {
            match handle.await.unwrap()? {
                VerifyOutcome::Mismatch { .. } => mismatches += 1,
                VerifyOutcome::TooManyAttempts => too_many += 1,
                VerifyOutcome::NotFound => not_found += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        // Exactly three attempts are charged, one call sees the dead entry
        // and deletes it, the rest find nothing.
        assert_eq!(mismatches, 3);
        assert_eq!(too_many, 1);
        assert_eq!(not_found, 6);

        Ok(())
    }
}
