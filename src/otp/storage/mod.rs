//! Storage seam for verification entries.
//!
//! The store keeps its business rules in [`OtpEntry::evaluate`]; a backend
//! only has to keep one entry per key and apply each verification step
//! atomically. Only the in-memory backend ships with this crate.

use async_trait::async_trait;

use crate::otp::outcome::VerifyOutcome;
use crate::otp::record::OtpEntry;
use crate::{OtpError, VerificationKey};

mod memory;
pub use memory::MemoryStorage;

/// Statistics about the storage backend.
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Total number of entries held, expired or not
    pub total_records: usize,
    /// Entries whose deadline has passed but that are still held
    pub expired_records: usize,
    /// Additional backend-specific information
    pub backend_info: String,
}

/// Abstract storage backend for verification entries.
///
/// # Atomicity
///
/// [`check_and_consume`](OtpStorage::check_and_consume) must read the entry,
/// evaluate it and apply the resulting [`EntryAction`](crate::otp::record::EntryAction)
/// without any other operation on the same key interleaving. A backend that
/// cannot hold a lock across those steps needs a per-key compare-and-swap.
///
/// # Example Implementation
///
/// ```rust
/// use otp_store::storage::{OtpStorage, StorageStats};
/// use otp_store::{EntryAction, OtpEntry, OtpError, VerificationKey, VerifyOutcome};
/// use async_trait::async_trait;
/// use std::collections::BTreeMap;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// pub struct OrderedStorage {
///     data: Mutex<BTreeMap<String, OtpEntry>>,
/// }
///
/// fn lock_err<T>(_: T) -> OtpError {
///     OtpError::Storage("lock poisoned".to_string())
/// }
///
/// #[async_trait]
/// impl OtpStorage for OrderedStorage {
///     async fn put(&self, key: &VerificationKey, entry: OtpEntry) -> Result<Option<OtpEntry>, OtpError> {
///         Ok(self.data.lock().map_err(lock_err)?.insert(key.to_string(), entry))
///     }
///
///     async fn get(&self, key: &VerificationKey) -> Result<Option<OtpEntry>, OtpError> {
///         Ok(self.data.lock().map_err(lock_err)?.get(&key.to_string()).cloned())
///     }
///
///     async fn check_and_consume(
///         &self,
///         key: &VerificationKey,
///         code: &str,
///         now_ms: u64,
///         max_attempts: u32,
///     ) -> Result<VerifyOutcome, OtpError> {
///         let mut data = self.data.lock().map_err(lock_err)?;
///         let k = key.to_string();
///         let Some(entry) = data.get_mut(&k) else {
///             return Ok(VerifyOutcome::NotFound);
///         };
///         let (outcome, action) = entry.evaluate(code, now_ms, max_attempts);
///         match action {
///             EntryAction::Delete => {
///                 data.remove(&k);
///             }
///             EntryAction::RecordFailedAttempt => entry.attempts += 1,
///         }
///         Ok(outcome)
///     }
///
///     async fn remove_expired(&self, now_ms: u64) -> Result<usize, OtpError> {
///         let mut data = self.data.lock().map_err(lock_err)?;
///         let before = data.len();
///         data.retain(|_, entry| !entry.is_expired(now_ms));
///         Ok(before - data.len())
///     }
///
///     async fn get_stats(&self, now_ms: u64) -> Result<StorageStats, OtpError> {
///         let data = self.data.lock().map_err(lock_err)?;
///         Ok(StorageStats {
///             total_records: data.len(),
///             expired_records: data.values().filter(|e| e.is_expired(now_ms)).count(),
///             backend_info: "Ordered BTreeMap storage".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait OtpStorage: Send + Sync {
    /// Optional method for storage backend initialization.
    ///
    /// Called once by [`OtpStoreBuilder::build_and_init`](crate::OtpStoreBuilder::build_and_init).
    async fn init(&self) -> Result<(), OtpError> {
        // Default implementation does nothing
        Ok(())
    }

    /// Stores `entry` under `key`, unconditionally replacing any previous
    /// entry.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(OtpEntry))` - The entry that was replaced
    /// * `Ok(None)` - If the key had no entry
    /// * `Err(OtpError)` - If there was an error accessing storage
    async fn put(
        &self,
        key: &VerificationKey,
        entry: OtpEntry,
    ) -> Result<Option<OtpEntry>, OtpError>;

    /// Retrieves the entry for `key` without modifying it.
    ///
    /// Expired entries are returned as-is; the caller decides what they mean.
    async fn get(&self, key: &VerificationKey) -> Result<Option<OtpEntry>, OtpError>;

    /// Atomically evaluates a submitted code against the entry for `key`
    /// and applies the resulting action.
    ///
    /// # Returns
    ///
    /// * `Ok(VerifyOutcome::NotFound)` - If the key has no entry
    /// * `Ok(outcome)` - The outcome from [`OtpEntry::evaluate`]
    /// * `Err(OtpError)` - If there was an error accessing storage
    async fn check_and_consume(
        &self,
        key: &VerificationKey,
        code: &str,
        now_ms: u64,
        max_attempts: u32,
    ) -> Result<VerifyOutcome, OtpError>;

    /// Removes every entry whose deadline is before `now_ms`.
    ///
    /// Entries that are merely attempt-exhausted must be left alone.
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - Number of entries that were removed
    /// * `Err(OtpError)` - If there was an error accessing storage
    async fn remove_expired(&self, now_ms: u64) -> Result<usize, OtpError>;

    /// Returns statistics about the storage backend without modifying it.
    async fn get_stats(&self, now_ms: u64) -> Result<StorageStats, OtpError>;
}
