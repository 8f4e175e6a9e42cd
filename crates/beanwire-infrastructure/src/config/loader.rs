//! Configuration loader
//!
//! Sources are merged in this order, later sources overriding earlier ones:
//!
//! 1. `AppConfig::default()`
//! 2. TOML file (explicit path, or `beanwire.toml` discovered in the working
//!    directory or the user config directory)
//! 3. Environment variables, e.g. `BEANWIRE_LEASE__RENEW_INTERVAL_MS=500`

use std::env;
use std::path::{Path, PathBuf};

use beanwire_domain::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use crate::config::AppConfig;
use crate::constants::*;
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load and validate configuration from all sources
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        match &self.config_path {
            Some(config_path) if config_path.exists() => {
                figment = figment.merge(Toml::file(config_path));
                log_config_loaded(config_path, true);
            }
            Some(config_path) => log_config_loaded(config_path, false),
            None => {
                if let Some(default_path) = Self::find_default_config_path() {
                    figment = figment.merge(Toml::file(&default_path));
                    log_config_loaded(&default_path, true);
                }
            }
        }

        figment = figment.merge(
            Env::prefixed(&format!("{}_", self.env_prefix)).split(CONFIG_ENV_SEPARATOR),
        );

        let app_config: AppConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_app_config(&app_config)?;
        Ok(app_config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).config_context("Failed to serialize config to TOML")?;
        std::fs::write(path.as_ref(), toml_string).config_context("Failed to write config file")?;
        Ok(())
    }

    /// Configured file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    validate_subsystem_config(config)?;
    validate_lease_config(config)?;
    validate_registry_config(config)?;
    validate_resilience_config(config)?;
    parse_log_level(&config.logging.level)?;
    Ok(())
}

fn validate_subsystem_config(config: &AppConfig) -> Result<()> {
    if config.subsystem.name.trim().is_empty() {
        return Err(Error::configuration("Subsystem name cannot be empty"));
    }
    Ok(())
}

fn validate_lease_config(config: &AppConfig) -> Result<()> {
    if config.lease.renew_interval_ms == 0 {
        return Err(Error::configuration("Lease renewal interval cannot be 0"));
    }
    Ok(())
}

fn validate_registry_config(config: &AppConfig) -> Result<()> {
    let registry = &config.registry;
    if registry.export_interval_ms == 0 {
        return Err(Error::configuration("Export interval cannot be 0"));
    }
    if registry.retry_interval_ms == 0 {
        return Err(Error::configuration("Export retry interval cannot be 0"));
    }
    if registry.retry_interval_ms > registry.export_interval_ms {
        return Err(Error::configuration(
            "Export retry interval cannot exceed the export interval",
        ));
    }
    if registry.lease_ms <= registry.export_interval_ms {
        return Err(Error::configuration(
            "Registry lease must be longer than the export interval",
        ));
    }
    Ok(())
}

fn validate_resilience_config(config: &AppConfig) -> Result<()> {
    if config.resilience.default_max_concurrent == 0 {
        return Err(Error::configuration("Bulkhead limit cannot be 0"));
    }
    if let Some((name, _)) = config
        .resilience
        .circuits
        .iter()
        .find(|(_, circuit)| circuit.max_concurrent == Some(0))
    {
        return Err(Error::configuration(format!(
            "Bulkhead limit of circuit '{name}' cannot be 0"
        )));
    }
    Ok(())
}

/// Configuration builder for programmatic configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    /// Start from defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subsystem name
    pub fn with_subsystem(mut self, name: impl Into<String>) -> Self {
        self.config.subsystem.name = name.into();
        self
    }

    /// Set the lease configuration
    pub fn with_lease(mut self, lease: crate::config::LeaseConfig) -> Self {
        self.config.lease = lease;
        self
    }

    /// Set the registry configuration
    pub fn with_registry(mut self, registry: crate::config::RegistryConfig) -> Self {
        self.config.registry = registry;
        self
    }

    /// Set the resilience configuration
    pub fn with_resilience(mut self, resilience: crate::config::ResilienceConfig) -> Self {
        self.config.resilience = resilience;
        self
    }

    /// Set the logging configuration
    pub fn with_logging(mut self, logging: crate::config::LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<AppConfig> {
        validate_app_config(&self.config)?;
        Ok(self.config)
    }
}
