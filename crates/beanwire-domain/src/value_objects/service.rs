//! Service metadata
//!
//! [`ServiceDefinition`] is declared once at startup for every remote service
//! a process consumes or exports. [`ServiceProperties`] is what a provider
//! publishes to the registry and what a consumer needs to connect to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SERIALIZER, DEFAULT_SUBSYSTEM, PROPERTY_API_VERSION, PROPERTY_COMPONENT,
    PROPERTY_QUALIFIER, PROPERTY_SUBSYSTEM, UNVERSIONED_API_VERSION,
};
use crate::error::{Error, Result};
use crate::value_objects::BeanKey;

/// How arguments and results of a service are serialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationConfig {
    /// Serializer name, resolved through the serializer registry
    pub serializer: String,
    /// Api version sent with every request
    pub version: u32,
    /// Versioned services may be consumed across subsystem boundaries
    pub versioned: bool,
}

impl SerializationConfig {
    /// Versioned api using the given serializer
    pub fn versioned(serializer: impl Into<String>, version: u32) -> Self {
        Self {
            serializer: serializer.into(),
            version,
            versioned: true,
        }
    }

    /// Unversioned api using the default serializer
    pub fn unversioned() -> Self {
        Self::default()
    }
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            serializer: DEFAULT_SERIALIZER.to_string(),
            version: UNVERSIONED_API_VERSION,
            versioned: false,
        }
    }
}

/// Declaration of a remote service bean
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    /// Key under which the bean is obtained
    pub bean_key: BeanKey,
    /// Exposed api name, sent as the `serviceApi` header
    pub api: String,
    /// Transport component used when exporting
    pub transport_component: String,
    /// Serialization settings
    pub serialization: SerializationConfig,
    /// Use the bean qualifier when looking the provider up
    pub dynamic_qualified: bool,
}

impl ServiceDefinition {
    /// Create a definition with an unversioned api
    pub fn new(
        bean_key: BeanKey,
        api: impl Into<String>,
        transport_component: impl Into<String>,
    ) -> Self {
        Self {
            bean_key,
            api: api.into(),
            transport_component: transport_component.into(),
            serialization: SerializationConfig::default(),
            dynamic_qualified: false,
        }
    }

    /// Set serialization settings
    pub fn with_serialization(mut self, serialization: SerializationConfig) -> Self {
        self.serialization = serialization;
        self
    }

    /// Look providers up by the bean qualifier
    pub fn dynamic_qualified(mut self) -> Self {
        self.dynamic_qualified = true;
        self
    }

    /// Whether the api is versioned
    pub fn is_versioned(&self) -> bool {
        self.serialization.versioned
    }

    /// Qualifier used for registry lookups
    pub fn lookup_qualifier(&self) -> Option<&str> {
        if self.dynamic_qualified {
            self.bean_key.qualifier()
        } else {
            None
        }
    }
}

/// Connection metadata published by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProperties {
    /// Transport component name
    pub component: String,
    /// Provider qualifier
    pub qualifier: Option<String>,
    /// Subsystem owning the provider
    pub subsystem: String,
    /// Transport specific properties
    pub properties: BTreeMap<String, String>,
}

impl ServiceProperties {
    /// Create properties for the given component in the default subsystem
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            qualifier: None,
            subsystem: DEFAULT_SUBSYSTEM.to_string(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the qualifier
    pub fn with_qualifier(mut self, qualifier: Option<String>) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Set the subsystem
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Add a transport specific property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get a transport specific property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Record the api version the provider speaks
    pub fn with_api_version(self, version: u32) -> Self {
        self.with_property(PROPERTY_API_VERSION, version.to_string())
    }

    /// Api version the provider speaks, if published
    pub fn api_version(&self) -> Option<u32> {
        self.property(PROPERTY_API_VERSION)?.parse().ok()
    }

    /// Registry entry for these properties
    pub fn to_entry(&self, api: &str, lease_millis: u64) -> RegistryEntry {
        let mut properties = self.properties.clone();
        properties.insert(PROPERTY_COMPONENT.to_string(), self.component.clone());
        properties.insert(PROPERTY_SUBSYSTEM.to_string(), self.subsystem.clone());
        RegistryEntry {
            service_bean_type: api.to_string(),
            qualifier: self.qualifier.clone(),
            properties,
            lease_millis,
        }
    }
}

/// Entry persisted in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Exposed api name
    pub service_bean_type: String,
    /// Provider qualifier
    pub qualifier: Option<String>,
    /// Properties, always including `component`
    pub properties: BTreeMap<String, String>,
    /// Lease length in milliseconds
    pub lease_millis: u64,
}

impl RegistryEntry {
    /// Service properties described by this entry
    pub fn to_properties(&self) -> Result<ServiceProperties> {
        let mut properties = self.properties.clone();
        let component = properties.remove(PROPERTY_COMPONENT).ok_or_else(|| {
            Error::registry(format!(
                "Registry entry for {} has no '{}' property",
                self.service_bean_type, PROPERTY_COMPONENT
            ))
        })?;
        let subsystem = properties
            .remove(PROPERTY_SUBSYSTEM)
            .unwrap_or_else(|| DEFAULT_SUBSYSTEM.to_string());
        properties.remove(PROPERTY_QUALIFIER);
        Ok(ServiceProperties {
            component,
            qualifier: self.qualifier.clone(),
            subsystem,
            properties,
        })
    }
}
