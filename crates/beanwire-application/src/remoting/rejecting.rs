//! Stand-in plumbing for proxies that must not reach a provider

use async_trait::async_trait;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::{ObjectSerializer, Transport};
use beanwire_domain::{InvocationRequest, InvocationResponse, Payload, RemoteResult, RoutingKey};
use serde_json::Value;

/// Transport that fails every call with a fixed error
#[derive(Debug, Clone)]
pub struct RejectingTransport {
    error: Error,
}

impl RejectingTransport {
    /// Reject with `error`
    pub fn new(error: Error) -> Self {
        Self { error }
    }
}

#[async_trait]
impl Transport for RejectingTransport {
    async fn submit_routed(
        &self,
        _request: InvocationRequest,
        _routing_key: Option<RoutingKey>,
    ) -> Result<InvocationResponse> {
        Err(self.error.clone())
    }

    async fn submit_broadcast(
        &self,
        _request: InvocationRequest,
    ) -> Result<Vec<RemoteResult<InvocationResponse>>> {
        Err(self.error.clone())
    }

    fn partition_count(&self) -> usize {
        0
    }
}

/// Unversioned JSON, enough to build requests that are never sent
pub(crate) struct PlainSerializer;

impl ObjectSerializer for PlainSerializer {
    fn name(&self) -> &str {
        "plain"
    }

    fn serialize(&self, value: &Value, _type_name: &str, _version: u32) -> Result<Payload> {
        serde_json::to_vec(value).map_err(Error::from)
    }

    fn deserialize(&self, payload: &[u8], _type_name: &str, _version: u32) -> Result<Value> {
        serde_json::from_slice(payload).map_err(Error::from)
    }
}
