//! Configuration types module

pub mod app;
pub mod lease;
pub mod logging;
pub mod registry;
pub mod resilience;
pub mod subsystem;

pub use app::AppConfig;
pub use lease::LeaseConfig;
pub use logging::LoggingConfig;
pub use registry::RegistryConfig;
pub use resilience::{CircuitConfig, ResilienceConfig};
pub use subsystem::SubsystemConfig;
