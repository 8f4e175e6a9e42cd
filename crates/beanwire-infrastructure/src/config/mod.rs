//! Configuration
//!
//! [`AppConfig`] is assembled by [`ConfigLoader`] from defaults, an optional
//! TOML file and `BEANWIRE_` environment variables.

pub mod loader;
pub mod types;

pub use loader::{ConfigBuilder, ConfigLoader};
pub use types::*;
