//! Transport Port
//!
//! A transport instance is connected to one provider. Timeout semantics
//! belong to the transport; callers turn `Transport` and `Timeout` errors
//! into `ServiceUnavailable`.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::{InvocationRequest, InvocationResponse, RemoteResult, RoutingKey};

/// Wire transport connected to a provider
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to the partition selected by `routing_key`
    ///
    /// Without a key any single partition may answer.
    async fn submit_routed(
        &self,
        request: InvocationRequest,
        routing_key: Option<RoutingKey>,
    ) -> Result<InvocationResponse>;

    /// Send a request to every partition concurrently
    async fn submit_broadcast(
        &self,
        request: InvocationRequest,
    ) -> Result<Vec<RemoteResult<InvocationResponse>>>;

    /// Number of partitions behind this transport
    fn partition_count(&self) -> usize;
}
