//! Main application configuration

use serde::{Deserialize, Serialize};

use super::{LeaseConfig, LoggingConfig, RegistryConfig, ResilienceConfig, SubsystemConfig};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Subsystem membership
    pub subsystem: SubsystemConfig,

    /// Lease renewal
    pub lease: LeaseConfig,

    /// Service registration
    pub registry: RegistryConfig,

    /// Fault tolerance
    pub resilience: ResilienceConfig,

    /// Logging
    pub logging: LoggingConfig,
}
