//! Domain constants
//!
//! Wire-level names shared by every transport and registry backend.

// ============================================================================
// INVOCATION HEADERS
// ============================================================================

/// Header naming the exposed service api
pub const HEADER_SERVICE_API: &str = "serviceApi";

/// Header carrying the canonical method signature
pub const HEADER_SERVICE_METHOD_SIGNATURE: &str = "serviceMethodSignature";

/// Header carrying the api version as a decimal string
pub const HEADER_API_VERSION: &str = "apiVersion";

// ============================================================================
// SERVICE PROPERTY KEYS
// ============================================================================

/// Property naming the transport component of a provider
pub const PROPERTY_COMPONENT: &str = "component";

/// Property naming the subsystem of a provider
pub const PROPERTY_SUBSYSTEM: &str = "subsystem";

/// Property carrying the qualifier of a provider
pub const PROPERTY_QUALIFIER: &str = "qualifier";

/// Property carrying the api version a provider speaks
pub const PROPERTY_API_VERSION: &str = "apiVersion";

/// Subsystem assigned to providers and consumers that do not declare one
pub const DEFAULT_SUBSYSTEM: &str = "default";

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Version used by unversioned services
pub const UNVERSIONED_API_VERSION: u32 = 1;

/// Serializer name used when a definition does not name one
pub const DEFAULT_SERIALIZER: &str = "json";
