//! Serializer Registry
//!
//! Serializers register themselves in [`SERIALIZER_PROVIDERS`] and are
//! resolved by the name given in a service definition's
//! [`SerializationConfig`].

use std::sync::Arc;

use beanwire_domain::SerializationConfig;
use beanwire_domain::ports::ObjectSerializer;

/// Registry entry for serializers
pub struct SerializerProviderEntry {
    /// Unique serializer name (e.g. "json")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create a serializer instance
    pub factory: fn(&SerializationConfig) -> Result<Arc<dyn ObjectSerializer>, String>,
}

#[linkme::distributed_slice]
pub static SERIALIZER_PROVIDERS: [SerializerProviderEntry] = [..];

/// Resolve a serializer by the name in `config`
///
/// # Returns
/// * `Ok(Arc<dyn ObjectSerializer>)` - Created serializer
/// * `Err(String)` - Unknown name or factory failure
pub fn resolve_serializer(config: &SerializationConfig) -> Result<Arc<dyn ObjectSerializer>, String> {
    SERIALIZER_PROVIDERS
        .iter()
        .find(|entry| entry.name == config.serializer)
        .map_or_else(
            || {
                let available = list_serializers()
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>();
                Err(format!(
                    "Unknown serializer '{}'. Available serializers: {available:?}",
                    config.serializer
                ))
            },
            |entry| (entry.factory)(config),
        )
}

/// List all registered serializers as `(name, description)`
pub fn list_serializers() -> Vec<(&'static str, &'static str)> {
    SERIALIZER_PROVIDERS
        .iter()
        .map(|entry| (entry.name, entry.description))
        .collect()
}
