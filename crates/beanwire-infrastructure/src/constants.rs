//! Infrastructure layer constants
//!
//! Defaults for every configuration section. Wire-level names live in
//! `beanwire_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "beanwire.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "beanwire";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "BEANWIRE";

/// Separator between nested keys in environment variable names
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LEASE CONSTANTS
// ============================================================================

/// Interval between lease renewal passes (milliseconds)
pub const DEFAULT_LEASE_RENEW_INTERVAL_MS: u64 = 1_000;

/// Maximum random delay added to each renewal pass (milliseconds)
pub const DEFAULT_LEASE_JITTER_MS: u64 = 0;

// ============================================================================
// REGISTRY CONSTANTS
// ============================================================================

/// Interval between re-registrations of exported services (milliseconds)
pub const DEFAULT_EXPORT_INTERVAL_MS: u64 = 5_000;

/// Delay before retrying a failed registration (milliseconds)
pub const DEFAULT_EXPORT_RETRY_INTERVAL_MS: u64 = 1_000;

/// Lifetime of a registry entry that is not renewed (milliseconds)
pub const DEFAULT_REGISTRY_LEASE_MS: u64 = 15_000;

// ============================================================================
// RESILIENCE CONSTANTS
// ============================================================================

/// Concurrent calls admitted per circuit by the bulkhead
pub const DEFAULT_BULKHEAD_MAX_CONCURRENT: usize = 64;

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "BEANWIRE_LOG";

/// Log file name used when the configured path has no stem
pub const DEFAULT_LOG_FILE_STEM: &str = "beanwire";

// ============================================================================
// TRANSPORT CONSTANTS
// ============================================================================

/// Name of the in-process transport component
pub const DIRECT_TRANSPORT: &str = "direct";

/// Property carrying the endpoint id of a direct export
pub const PROPERTY_DIRECT_ENDPOINT: &str = "direct.endpoint";

/// Property carrying the partition count of a direct export
pub const PROPERTY_DIRECT_PARTITIONS: &str = "direct.partitions";
