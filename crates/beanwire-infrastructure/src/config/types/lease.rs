//! Lease configuration types

use std::time::Duration;

use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Lease renewal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseConfig {
    /// Interval between renewal passes (milliseconds)
    pub renew_interval_ms: u64,

    /// Maximum random delay added to each pass (milliseconds)
    pub jitter_ms: u64,
}

impl LeaseConfig {
    /// Renewal interval
    pub fn renew_interval(&self) -> Duration {
        Duration::from_millis(self.renew_interval_ms)
    }

    /// Maximum jitter
    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            renew_interval_ms: DEFAULT_LEASE_RENEW_INTERVAL_MS,
            jitter_ms: DEFAULT_LEASE_JITTER_MS,
        }
    }
}
