//! Plugin Registries
//!
//! Implementations register themselves at link time with `linkme`:
//!
//! ```ignore
//! use beanwire_application::ports::registry::{SERIALIZER_PROVIDERS, SerializerProviderEntry};
//!
//! #[linkme::distributed_slice(SERIALIZER_PROVIDERS)]
//! static JSON: SerializerProviderEntry = SerializerProviderEntry {
//!     name: "json",
//!     description: "JSON payloads with per-type version adapters",
//!     factory: |_| Ok(Arc::new(JsonSerializer::new())),
//! };
//! ```

pub mod serializer;

pub use serializer::{
    SERIALIZER_PROVIDERS, SerializerProviderEntry, list_serializers, resolve_serializer,
};
