//! Subsystem configuration types

use beanwire_domain::constants::DEFAULT_SUBSYSTEM;
use serde::{Deserialize, Serialize};

/// Subsystem this process belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsystemConfig {
    /// Subsystem name, published with every exported service
    pub name: String,

    /// Refuse non-versioned services owned by other subsystems
    pub enforce_boundaries: bool,
}

impl Default for SubsystemConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SUBSYSTEM.to_string(),
            enforce_boundaries: true,
        }
    }
}
