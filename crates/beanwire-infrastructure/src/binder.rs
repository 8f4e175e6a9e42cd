//! Service binder
//!
//! Turns registry properties into a client adapter for a [`RemoteApi`]:
//!
//! ```text
//! properties ──▶ subsystem check ──▶ transport component.connect ──▶ RemotingProxy ──▶ A::bind
//!     │                │
//!     └─ none ─────────┴─ violation ──▶ rejecting stand-in
//! ```

use std::sync::Arc;

use beanwire_application::ports::TransportComponent;
use beanwire_application::{RemoteApi, RemotingProxy};
use beanwire_domain::constants::PROPERTY_API_VERSION;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::FaultTolerance;
use beanwire_domain::{ServiceDefinition, ServiceProperties};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::SubsystemConfig;
use crate::error_ext::ErrorContext;
use crate::serializer::SerializerCatalog;

/// Builds client adapters from registry properties
pub struct ServiceBinder {
    subsystem: SubsystemConfig,
    components: DashMap<String, Arc<dyn TransportComponent>>,
    serializers: Arc<SerializerCatalog>,
    fault_tolerance: Option<Arc<dyn FaultTolerance>>,
}

impl ServiceBinder {
    /// Binder for a process in `subsystem`
    pub fn new(subsystem: SubsystemConfig, serializers: Arc<SerializerCatalog>) -> Self {
        Self {
            subsystem,
            components: DashMap::new(),
            serializers,
            fault_tolerance: None,
        }
    }

    /// Guard every bound proxy with admission control
    pub fn with_fault_tolerance(mut self, fault_tolerance: Arc<dyn FaultTolerance>) -> Self {
        self.fault_tolerance = Some(fault_tolerance);
        self
    }

    /// Make a transport component available
    pub fn add_component(&self, component: Arc<dyn TransportComponent>) {
        self.components
            .insert(component.name().to_string(), component);
    }

    /// Transport component by name
    pub fn component(&self, name: &str) -> Option<Arc<dyn TransportComponent>> {
        self.components.get(name).map(|c| Arc::clone(c.value()))
    }

    /// Subsystem of this process
    pub fn subsystem(&self) -> &SubsystemConfig {
        &self.subsystem
    }

    /// Serializers used for bound proxies
    pub fn serializers(&self) -> &Arc<SerializerCatalog> {
        &self.serializers
    }

    /// Adapter for the provider described by `properties`
    ///
    /// Missing properties and subsystem violations yield stand-ins that fail
    /// every call. Connection failures are returned as errors.
    pub fn bind<A: RemoteApi>(
        &self,
        definition: &ServiceDefinition,
        properties: Option<&ServiceProperties>,
    ) -> Result<Arc<A::Target>> {
        let Some(properties) = properties else {
            debug!(service = %definition.api, "No provider registered, binding stand-in");
            return Ok(Self::not_registered::<A>(definition));
        };

        if let Err(violation) = self.check_subsystem(definition, properties) {
            warn!(
                service = %definition.api,
                subsystem = %self.subsystem.name,
                provider_subsystem = %properties.subsystem,
                "Refusing provider from another subsystem"
            );
            return Ok(Self::rejecting::<A>(definition, violation));
        }

        let component = self.component(&properties.component).ok_or_else(|| {
            Error::configuration(format!(
                "No transport component '{}' for {}",
                properties.component, definition.api
            ))
        })?;
        let transport = component.connect(&definition.api, properties)?;
        let serializer = self.serializers.resolve(&definition.serialization)?;
        let version = negotiated_version(definition, properties)?;

        let mut proxy = RemotingProxy::new(definition.api.clone(), version, serializer, transport);
        if let Some(fault_tolerance) = &self.fault_tolerance {
            proxy = proxy.with_fault_tolerance(Arc::clone(fault_tolerance));
        }
        debug!(
            service = %definition.api,
            component = %properties.component,
            qualifier = ?properties.qualifier,
            version,
            "Bound remote service"
        );
        Ok(A::bind(proxy))
    }

    /// Stand-in failing every call with `ServiceUnavailable`
    pub fn not_registered<A: RemoteApi>(definition: &ServiceDefinition) -> Arc<A::Target> {
        Self::rejecting::<A>(
            definition,
            Error::service_unavailable(definition.api.clone(), "no provider is registered"),
        )
    }

    /// Stand-in failing every call with `error`
    pub fn rejecting<A: RemoteApi>(definition: &ServiceDefinition, error: Error) -> Arc<A::Target> {
        A::bind(RemotingProxy::rejecting(
            definition.api.clone(),
            definition.serialization.version,
            error,
        ))
    }

    fn check_subsystem(&self, definition: &ServiceDefinition, properties: &ServiceProperties) -> Result<()> {
        if !self.subsystem.enforce_boundaries
            || definition.is_versioned()
            || properties.subsystem == self.subsystem.name
        {
            return Ok(());
        }
        Err(Error::illegal_subsystem(
            definition.api.clone(),
            self.subsystem.name.clone(),
            properties.subsystem.clone(),
        ))
    }
}

/// Highest version both sides understand
fn negotiated_version(definition: &ServiceDefinition, properties: &ServiceProperties) -> Result<u32> {
    let own = definition.serialization.version;
    let Some(raw) = properties.property(PROPERTY_API_VERSION) else {
        return Ok(own);
    };
    let provider: u32 = raw.parse().registry_context(format!(
        "Provider of {} published malformed {PROPERTY_API_VERSION} '{raw}'",
        definition.api
    ))?;
    Ok(own.min(provider))
}

impl std::fmt::Debug for ServiceBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut components: Vec<String> = self.components.iter().map(|c| c.key().clone()).collect();
        components.sort();
        f.debug_struct("ServiceBinder")
            .field("subsystem", &self.subsystem.name)
            .field("components", &components)
            .finish()
    }
}
