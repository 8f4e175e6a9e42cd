//! Transport Component Port
//!
//! A transport component is the named plugin behind a service definition's
//! `transport_component`. On the provider side it makes activators reachable
//! and describes how to reach them; on the consumer side it turns those
//! properties back into a connected [`Transport`].

use std::collections::BTreeMap;
use std::sync::Arc;

use beanwire_domain::ServiceProperties;
use beanwire_domain::error::Result;
use beanwire_domain::ports::Transport;

use crate::activator::ServiceActivator;

/// Named wire transport plugin
pub trait TransportComponent: Send + Sync {
    /// Component name, matched against `ServiceDefinition::transport_component`
    fn name(&self) -> &str;

    /// Make `api` reachable through one activator per partition
    ///
    /// Returns the transport-specific properties consumers need to connect.
    fn export(
        &self,
        api: &str,
        partitions: Vec<Arc<ServiceActivator>>,
    ) -> Result<BTreeMap<String, String>>;

    /// Withdraw an export made with the given properties
    fn unexport(&self, properties: &ServiceProperties) -> Result<()>;

    /// Connect to the provider described by `properties`
    fn connect(&self, api: &str, properties: &ServiceProperties) -> Result<Arc<dyn Transport>>;
}
