// Core architecture components
mod code;
mod config;
mod error;
mod outcome;
mod record;
mod store;
mod store_builder;
mod time_utils;

// Storage, expiry and delivery
pub mod delivery;
pub mod storage;
pub mod sweeper;

// Metrics (optional feature)
#[cfg(feature = "metrics")]
pub mod metrics;

// Core components exports
pub use code::{CODE_LENGTH, generate_code, generate_code_with};
pub use config::{ConfigPreset, OtpConfig};
pub use error::OtpError;
pub use outcome::{OtpStats, ResendOutcome, VerifyOutcome};
pub use record::{EntryAction, OtpEntry};
pub use store::{CodeGeneratorFn, OtpStore, TimeProviderFn};
pub use store_builder::OtpStoreBuilder;

// Storage, expiry and delivery exports
pub use delivery::{
    CodeDispatcher, DeliveryReceipt, IssueOutcome, TracingDispatcher, issue_code, render_message,
};
pub use storage::{MemoryStorage, OtpStorage, StorageStats};
pub use sweeper::SweeperHandle;

// Metrics exports (optional feature)
#[cfg(feature = "metrics")]
pub use metrics::{
    InMemoryMetricsCollector, MetricEvent, MetricsCollector, NoOpMetricsCollector, OtpMetrics,
    OutcomeMetrics, PerformanceMetrics,
};
