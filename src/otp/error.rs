use thiserror::Error;

/// Infrastructure failures raised by the verification code store.
///
/// Business outcomes (wrong code, expired code, throttled resend, ...) are
/// never errors: they are reported as [`VerifyOutcome`](crate::VerifyOutcome)
/// and [`ResendOutcome`](crate::ResendOutcome) values. This enum only covers
/// conditions where the store could not do its job at all.
///
/// # Error Categories
///
/// - **Fatal**: `EntropyUnavailable`, the process cannot produce unpredictable codes
/// - **Environment**: `Clock`, `Storage`
/// - **Input / collaborators**: `InvalidChannel`, `Delivery`
///
/// # Example
///
/// ```rust
/// use otp_store::{Channel, OtpError, OtpStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = OtpStore::builder().build_and_init().await?;
///
/// match store.generate("a@example.com", Channel::Email).await {
///     Ok(code) => println!("hand {code} to the dispatcher"),
///     Err(OtpError::EntropyUnavailable(reason)) => panic!("no entropy: {reason}"),
///     Err(e) => println!("store failure: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum OtpError {
    /// The operating system refused to provide random bytes.
    ///
    /// Codes drawn without entropy would be predictable, so callers should
    /// treat this as fatal to the process rather than retry.
    #[error("Entropy unavailable: {0}")]
    EntropyUnavailable(String),

    /// The wall clock could not be read (e.g. it reports a time before the
    /// Unix epoch).
    #[error("Clock error: {0}")]
    Clock(String),

    /// A storage backend operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A channel name other than `email` or `sms` was supplied.
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// A delivery dispatcher could not hand the code to its transport.
    ///
    /// The generated code stays valid; the flow should offer a resend.
    #[error("Delivery error: {0}")]
    Delivery(String),
}
