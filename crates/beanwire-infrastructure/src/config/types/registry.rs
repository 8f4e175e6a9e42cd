//! Registry configuration types

use std::time::Duration;

use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Service registration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Interval between re-registrations of exported services (milliseconds)
    pub export_interval_ms: u64,

    /// Delay before retrying a failed registration (milliseconds)
    pub retry_interval_ms: u64,

    /// Lifetime of an entry that is not renewed (milliseconds)
    pub lease_ms: u64,
}

impl RegistryConfig {
    /// Export interval
    pub fn export_interval(&self) -> Duration {
        Duration::from_millis(self.export_interval_ms)
    }

    /// Retry interval
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            export_interval_ms: DEFAULT_EXPORT_INTERVAL_MS,
            retry_interval_ms: DEFAULT_EXPORT_RETRY_INTERVAL_MS,
            lease_ms: DEFAULT_REGISTRY_LEASE_MS,
        }
    }
}
