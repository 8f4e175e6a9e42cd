//! Serializers
//!
//! The JSON serializer registers itself in the application layer's
//! serializer registry. [`SerializerCatalog`] resolves a definition's
//! serializer, preferring explicitly configured instances (for example a
//! JSON serializer carrying version adapters) over registry defaults.

pub mod json;

use std::sync::Arc;

use beanwire_application::ports::registry::{
    SERIALIZER_PROVIDERS, SerializerProviderEntry, resolve_serializer,
};
use beanwire_domain::SerializationConfig;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::ObjectSerializer;
use dashmap::DashMap;

pub use json::{JsonSerializer, Migration};

#[linkme::distributed_slice(SERIALIZER_PROVIDERS)]
static JSON_SERIALIZER: SerializerProviderEntry = SerializerProviderEntry {
    name: "json",
    description: "JSON payloads with per-type version adapters",
    factory: |config| Ok(Arc::new(JsonSerializer::new(config.version))),
};

/// Serializer lookup by name and version
#[derive(Default)]
pub struct SerializerCatalog {
    configured: DashMap<(String, u32), Arc<dyn ObjectSerializer>>,
}

impl SerializerCatalog {
    /// Catalog backed by the serializer registry only
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `serializer` for every definition naming it at `version`
    pub fn register(&self, version: u32, serializer: Arc<dyn ObjectSerializer>) {
        self.configured
            .insert((serializer.name().to_string(), version), serializer);
    }

    /// Serializer for a definition's serialization settings
    pub fn resolve(&self, config: &SerializationConfig) -> Result<Arc<dyn ObjectSerializer>> {
        if let Some(serializer) = self
            .configured
            .get(&(config.serializer.clone(), config.version))
        {
            return Ok(Arc::clone(serializer.value()));
        }
        resolve_serializer(config).map_err(Error::configuration)
    }
}

impl std::fmt::Debug for SerializerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerCatalog")
            .field("configured", &self.configured.len())
            .finish()
    }
}
