//! Resilience configuration types

use std::collections::BTreeMap;

use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Settings of one circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Whether admission control applies to this circuit
    pub enabled: bool,

    /// Concurrent calls admitted; falls back to the section default
    pub max_concurrent: Option<usize>,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: None,
        }
    }
}

/// Fault tolerance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Apply the bulkhead to circuits without explicit settings
    pub enabled_by_default: bool,

    /// Concurrent calls admitted per circuit
    pub default_max_concurrent: usize,

    /// Per-circuit overrides, keyed by service api
    pub circuits: BTreeMap<String, CircuitConfig>,
}

impl ResilienceConfig {
    /// Whether a circuit is guarded
    pub fn is_enabled(&self, circuit: &str) -> bool {
        self.circuits
            .get(circuit)
            .map_or(self.enabled_by_default, |c| c.enabled)
    }

    /// Admission limit of a circuit
    pub fn max_concurrent(&self, circuit: &str) -> usize {
        self.circuits
            .get(circuit)
            .and_then(|c| c.max_concurrent)
            .unwrap_or(self.default_max_concurrent)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: false,
            default_max_concurrent: DEFAULT_BULKHEAD_MAX_CONCURRENT,
            circuits: BTreeMap::new(),
        }
    }
}
