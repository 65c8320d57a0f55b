use std::time::Duration;

/// Predefined configuration presets for common deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Production-ready configuration.
    ///
    /// - Code TTL: 10 minutes
    /// - Max attempts: 3
    /// - Resend interval: 60 seconds
    /// - Sweep interval: 5 minutes
    Production,

    /// Development-friendly configuration.
    ///
    /// Relaxed settings for manual testing:
    /// - Code TTL: 30 minutes
    /// - Max attempts: 5
    /// - Resend interval: 10 seconds
    /// - Sweep interval: 1 minute
    Development,

    /// High-security configuration.
    ///
    /// - Code TTL: 5 minutes
    /// - Max attempts: 3
    /// - Resend interval: 2 minutes
    /// - Sweep interval: 1 minute
    HighSecurity,

    /// Load configuration from environment variables.
    ///
    /// Reads configuration from:
    /// - `OTP_STORE_CODE_TTL`: Code TTL in seconds (default: 600)
    /// - `OTP_STORE_MAX_ATTEMPTS`: Failed attempts allowed per code (default: 3)
    /// - `OTP_STORE_RESEND_INTERVAL`: Minimum seconds between codes for one key (default: 60)
    /// - `OTP_STORE_SWEEP_INTERVAL`: Seconds between expiry sweeps (default: 300)
    FromEnv,
}

/// Configuration for the verification code store.
///
/// # Example
///
/// ```rust
/// use otp_store::OtpConfig;
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = OtpConfig::default();
/// assert_eq!(config.code_ttl, Duration::from_secs(600));
///
/// // Create custom configuration
/// let config = OtpConfig {
///     code_ttl: Duration::from_secs(300),
///     ..OtpConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpConfig {
    /// Lifetime of a generated code
    pub code_ttl: Duration,
    /// Failed verification attempts allowed before the code is dead
    pub max_attempts: u32,
    /// Minimum gap between two codes for the same key, as reported by `resend_check`
    pub resend_interval: Duration,
    /// Period of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(600),
            max_attempts: 3,
            resend_interval: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

impl OtpConfig {
    /// Reads every field from its `OTP_STORE_*` variable, falling back to
    /// the default for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            code_ttl: Duration::from_secs(env_or(
                "OTP_STORE_CODE_TTL",
                defaults.code_ttl.as_secs(),
            )),
            max_attempts: env_or("OTP_STORE_MAX_ATTEMPTS", defaults.max_attempts),
            resend_interval: Duration::from_secs(env_or(
                "OTP_STORE_RESEND_INTERVAL",
                defaults.resend_interval.as_secs(),
            )),
            sweep_interval: Duration::from_secs(env_or(
                "OTP_STORE_SWEEP_INTERVAL",
                defaults.sweep_interval.as_secs(),
            )),
        }
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// # Returns
    ///
    /// A vector of warning messages for potentially problematic settings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_attempts == 0 {
            warnings.push("Zero max attempts makes every code unverifiable".to_string());
        }

        if self.code_ttl < self.resend_interval {
            warnings.push(
                "Code TTL shorter than the resend interval leaves users without a valid code"
                    .to_string(),
            );
        }
        if self.code_ttl.as_secs() > 3600 {
            warnings.push("Long code TTL (> 1 hour) widens the guessing window".to_string());
        }

        if self.resend_interval.as_secs() < 10 {
            warnings.push(
                "Very short resend interval (< 10 seconds) invites delivery flooding".to_string(),
            );
        }

        if self.sweep_interval.is_zero() {
            warnings.push("Zero sweep interval disables the background sweep".to_string());
        } else if self.sweep_interval > self.code_ttl {
            warnings.push(
                "Sweep interval longer than code TTL lets expired codes pile up".to_string(),
            );
        }

        warnings
    }

    /// Returns a summary of the current configuration.
    pub fn summary(&self) -> String {
        format!(
            "OtpConfig {{ Code TTL: {}s, Max Attempts: {}, Resend Interval: {}s, Sweep Interval: {}s }}",
            self.code_ttl.as_secs(),
            self.max_attempts,
            self.resend_interval.as_secs(),
            self.sweep_interval.as_secs(),
        )
    }
}

impl From<ConfigPreset> for OtpConfig {
    fn from(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Production => Self::default(),
            ConfigPreset::Development => Self {
                code_ttl: Duration::from_secs(1800),
                max_attempts: 5,
                resend_interval: Duration::from_secs(10),
                sweep_interval: Duration::from_secs(60),
            },
            ConfigPreset::HighSecurity => Self {
                code_ttl: Duration::from_secs(300),
                max_attempts: 3,
                resend_interval: Duration::from_secs(120),
                sweep_interval: Duration::from_secs(60),
            },
            ConfigPreset::FromEnv => Self::from_env(),
        }
    }
}
