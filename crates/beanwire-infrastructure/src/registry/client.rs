//! Service registry client
//!
//! The two operations the runtime needs from a registry: find the current
//! provider of an api, and publish a provider with a lease.

use std::sync::Arc;

use beanwire_domain::{RegistryEntry, ServiceProperties};
use beanwire_domain::error::Result;
use beanwire_domain::ports::ServiceRegistryBackend;
use tracing::{debug, trace};

/// Registry operations over a configured backend
///
/// Safe for concurrent use; clones share the backend.
#[derive(Clone)]
pub struct ServiceRegistryClient {
    backend: Arc<dyn ServiceRegistryBackend>,
}

impl ServiceRegistryClient {
    /// Client over a backend
    pub fn new(backend: Arc<dyn ServiceRegistryBackend>) -> Self {
        Self { backend }
    }

    /// Current provider properties of an api, `None` when nothing is registered
    pub async fn lookup(&self, api: &str, qualifier: Option<&str>) -> Result<Option<ServiceProperties>> {
        let entry = self.backend.lookup(api, qualifier).await?;
        trace!(service = api, qualifier = ?qualifier, found = entry.is_some(), "Registry lookup");
        entry.map(|e| e.to_properties()).transpose()
    }

    /// Publish provider properties, replacing any previous registration
    pub async fn register(
        &self,
        api: &str,
        properties: &ServiceProperties,
        lease_millis: u64,
    ) -> Result<()> {
        debug!(
            service = api,
            qualifier = ?properties.qualifier,
            subsystem = %properties.subsystem,
            lease_millis,
            "Registering service"
        );
        self.backend
            .register(properties.to_entry(api, lease_millis))
            .await
    }

    /// Remove a registration
    pub async fn deregister(&self, api: &str, qualifier: Option<&str>) -> Result<()> {
        debug!(service = api, qualifier = ?qualifier, "Deregistering service");
        self.backend.deregister(api, qualifier).await
    }

    /// Every live registration
    pub async fn list(&self) -> Result<Vec<RegistryEntry>> {
        self.backend.list().await
    }

    /// Backend name
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl std::fmt::Debug for ServiceRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistryClient")
            .field("backend", &self.backend.name())
            .finish()
    }
}
