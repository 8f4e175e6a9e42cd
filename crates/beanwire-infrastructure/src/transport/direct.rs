//! Direct transport
//!
//! In-process transport component. Exported activators are kept in an
//! endpoint table; every request and response is encoded to JSON and back
//! so calls see the same value semantics as a networked transport.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beanwire_application::ServiceActivator;
use beanwire_application::ports::TransportComponent;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::Transport;
use beanwire_domain::{InvocationRequest, InvocationResponse, RemoteResult, RoutingKey, ServiceProperties};
use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, trace};

use crate::constants::{DIRECT_TRANSPORT, PROPERTY_DIRECT_ENDPOINT, PROPERTY_DIRECT_PARTITIONS};
use crate::error_ext::ErrorContext;

type EndpointTable = DashMap<String, Arc<Vec<Arc<ServiceActivator>>>>;

/// In-process [`TransportComponent`]
pub struct DirectTransportComponent {
    endpoints: Arc<EndpointTable>,
    next_endpoint: AtomicU64,
    timeout: Option<Duration>,
}

impl DirectTransportComponent {
    /// Component without call timeouts
    pub fn new() -> Self {
        Self {
            endpoints: Arc::new(DashMap::new()),
            next_endpoint: AtomicU64::new(1),
            timeout: None,
        }
    }

    /// Fail calls that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of live endpoints
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

impl Default for DirectTransportComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportComponent for DirectTransportComponent {
    fn name(&self) -> &str {
        DIRECT_TRANSPORT
    }

    fn export(
        &self,
        api: &str,
        partitions: Vec<Arc<ServiceActivator>>,
    ) -> Result<BTreeMap<String, String>> {
        if partitions.is_empty() {
            return Err(Error::configuration(format!(
                "Cannot export {api} without partitions"
            )));
        }
        let id = self.next_endpoint.fetch_add(1, Ordering::Relaxed);
        let endpoint = format!("{DIRECT_TRANSPORT}-{id}");
        let count = partitions.len();
        self.endpoints.insert(endpoint.clone(), Arc::new(partitions));
        debug!(service = api, endpoint = %endpoint, partitions = count, "Exported direct endpoint");
        Ok(BTreeMap::from([
            (PROPERTY_DIRECT_ENDPOINT.to_string(), endpoint),
            (PROPERTY_DIRECT_PARTITIONS.to_string(), count.to_string()),
        ]))
    }

    fn unexport(&self, properties: &ServiceProperties) -> Result<()> {
        let endpoint = endpoint_of(properties)?;
        self.endpoints.remove(endpoint);
        debug!(endpoint, "Removed direct endpoint");
        Ok(())
    }

    fn connect(&self, api: &str, properties: &ServiceProperties) -> Result<Arc<dyn Transport>> {
        let endpoint = endpoint_of(properties)?.to_string();
        let partition_count = properties
            .property(PROPERTY_DIRECT_PARTITIONS)
            .map(str::parse::<usize>)
            .transpose()
            .transport_context(format!("Invalid partition count for {api}"))?
            .unwrap_or(1);
        Ok(Arc::new(DirectTransport {
            api: api.to_string(),
            endpoint,
            partition_count,
            endpoints: Arc::clone(&self.endpoints),
            timeout: self.timeout,
        }))
    }
}

fn endpoint_of(properties: &ServiceProperties) -> Result<&str> {
    properties.property(PROPERTY_DIRECT_ENDPOINT).ok_or_else(|| {
        Error::transport(format!(
            "Missing '{PROPERTY_DIRECT_ENDPOINT}' property"
        ))
    })
}

/// Connection to one direct endpoint
struct DirectTransport {
    api: String,
    endpoint: String,
    partition_count: usize,
    endpoints: Arc<EndpointTable>,
    timeout: Option<Duration>,
}

impl DirectTransport {
    fn partitions(&self) -> Result<Arc<Vec<Arc<ServiceActivator>>>> {
        self.endpoints
            .get(&self.endpoint)
            .map(|p| Arc::clone(p.value()))
            .ok_or_else(|| {
                Error::transport(format!(
                    "Endpoint {} of {} is gone",
                    self.endpoint, self.api
                ))
            })
    }

    async fn call(&self, activator: &ServiceActivator, request: &InvocationRequest) -> Result<InvocationResponse> {
        let wire = serde_json::to_vec(request).transport_context("Failed to encode request")?;
        let request: InvocationRequest =
            serde_json::from_slice(&wire).transport_context("Failed to decode request")?;

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, activator.invoke_service(request))
                .await
                .map_err(|_| Error::timeout(format!("{} did not answer within {limit:?}", self.api)))?,
            None => activator.invoke_service(request).await,
        };

        let wire = serde_json::to_vec(&response).transport_context("Failed to encode response")?;
        serde_json::from_slice(&wire).transport_context("Failed to decode response")
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn submit_routed(
        &self,
        request: InvocationRequest,
        routing_key: Option<RoutingKey>,
    ) -> Result<InvocationResponse> {
        let partitions = self.partitions()?;
        let index = routing_key.map_or(0, |key| key.partition(partitions.len()));
        let activator = partitions
            .get(index)
            .ok_or_else(|| Error::transport(format!("No partition {index} for {}", self.api)))?;
        trace!(service = %self.api, partition = index, "Direct call");
        self.call(activator, &request).await
    }

    async fn submit_broadcast(
        &self,
        request: InvocationRequest,
    ) -> Result<Vec<RemoteResult<InvocationResponse>>> {
        let partitions = self.partitions()?;
        let calls = partitions.iter().enumerate().map(|(partition, activator)| {
            let request = &request;
            async move { RemoteResult::from_result(partition, self.call(activator, request).await) }
        });
        Ok(join_all(calls).await)
    }

    fn partition_count(&self) -> usize {
        self.partition_count
    }
}
