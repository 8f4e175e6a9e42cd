//! Configuration loading and validation

use std::env;
use std::fs;

use beanwire_domain::error::Error;
use beanwire_infrastructure::config::{
    AppConfig, ConfigBuilder, ConfigLoader, LeaseConfig, LoggingConfig, RegistryConfig,
};
use beanwire_infrastructure::logging::parse_log_level;
use tempfile::TempDir;

fn assert_config_error(result: beanwire_domain::Result<AppConfig>) {
    match result {
        Err(Error::Configuration { .. }) => {}
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn test_defaults_are_valid() {
    let config = ConfigBuilder::new().build().expect("defaults");
    assert_eq!(config.subsystem.name, "default");
    assert!(config.subsystem.enforce_boundaries);
    assert_eq!(config.lease.jitter_ms, 0);
    assert!(config.registry.retry_interval_ms <= config.registry.export_interval_ms);
    assert!(config.registry.lease_ms > config.registry.export_interval_ms);
    assert!(!config.resilience.enabled_by_default);
}

#[test]
fn test_toml_file_overrides_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("beanwire.toml");
    fs::write(
        &path,
        r#"
[subsystem]
name = "billing"

[lease]
renew_interval_ms = 250

[resilience.circuits."acme.Billing"]
max_concurrent = 2
"#,
    )
    .expect("write config");

    let config = ConfigLoader::new()
        .with_config_path(&path)
        .load()
        .expect("load");
    assert_eq!(config.subsystem.name, "billing");
    assert_eq!(config.lease.renew_interval_ms, 250);
    assert_eq!(config.lease.jitter_ms, LeaseConfig::default().jitter_ms);
    assert!(config.resilience.is_enabled("acme.Billing"));
    assert_eq!(config.resilience.max_concurrent("acme.Billing"), 2);
    assert!(!config.resilience.is_enabled("acme.Shipping"));
}

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("saved.toml");
    let config = ConfigBuilder::new()
        .with_subsystem("shipping")
        .with_registry(RegistryConfig {
            export_interval_ms: 2_000,
            retry_interval_ms: 500,
            lease_ms: 6_000,
        })
        .build()
        .expect("config");

    let loader = ConfigLoader::new().with_config_path(&path);
    loader.save_to_file(&config, &path).expect("save");
    let loaded = loader.load().expect("load");
    assert_eq!(loaded.subsystem, config.subsystem);
    assert_eq!(loaded.registry, config.registry);
}

#[test]
fn test_invalid_toml_values_are_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("beanwire.toml");
    fs::write(&path, "[registry]\nexport_interval_ms = 1000\nretry_interval_ms = 5000\n")
        .expect("write config");

    assert_config_error(ConfigLoader::new().with_config_path(&path).load());
}

#[test]
fn test_missing_explicit_file_falls_back_to_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let config = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .with_env_prefix("BEANWIRE_TEST_ABSENT")
        .load()
        .expect("load");
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_validation_rules() {
    assert_config_error(ConfigBuilder::new().with_subsystem("  ").build());
    assert_config_error(
        ConfigBuilder::new()
            .with_lease(LeaseConfig {
                renew_interval_ms: 0,
                jitter_ms: 0,
            })
            .build(),
    );
    assert_config_error(
        ConfigBuilder::new()
            .with_registry(RegistryConfig {
                export_interval_ms: 0,
                retry_interval_ms: 0,
                lease_ms: 1_000,
            })
            .build(),
    );
    assert_config_error(
        ConfigBuilder::new()
            .with_registry(RegistryConfig {
                export_interval_ms: 5_000,
                retry_interval_ms: 1_000,
                lease_ms: 5_000,
            })
            .build(),
    );
    assert_config_error(
        ConfigBuilder::new()
            .with_logging(LoggingConfig {
                level: "loud".to_string(),
                ..LoggingConfig::default()
            })
            .build(),
    );
}

#[test]
fn test_log_levels() {
    for level in ["trace", "debug", "info", "warn", "warning", "error", "INFO"] {
        assert!(parse_log_level(level).is_ok(), "{level}");
    }
    assert!(parse_log_level("verbose").is_err());
}

/// Run with: `cargo test -p beanwire-infrastructure --test unit config -- --test-threads=1 --ignored`
#[test]
#[ignore = "requires --test-threads=1 due to env var mutations"]
fn test_env_overrides_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("beanwire.toml");
    fs::write(&path, "[subsystem]\nname = \"billing\"\n").expect("write config");

    // SAFETY: Tests must run with --test-threads=1
    unsafe {
        env::set_var("BEANWIRE_SUBSYSTEM__NAME", "shipping");
        env::set_var("BEANWIRE_LEASE__JITTER_MS", "25");
    }
    let loaded = ConfigLoader::new().with_config_path(&path).load();
    // SAFETY: Tests must run with --test-threads=1
    unsafe {
        env::remove_var("BEANWIRE_SUBSYSTEM__NAME");
        env::remove_var("BEANWIRE_LEASE__JITTER_MS");
    }

    let config = loaded.expect("load");
    assert_eq!(config.subsystem.name, "shipping");
    assert_eq!(config.lease.jitter_ms, 25);
}
